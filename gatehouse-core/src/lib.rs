//! Gatehouse Core - shared domain types and ambient infrastructure
//!
//! Defines the user/role model, the collaborator traits the authentication
//! engines depend on, the clock abstraction, errors, configuration and logging.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;

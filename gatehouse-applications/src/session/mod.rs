//! Session Management Module
//!
//! In-memory server-side sessions with idle expiry, and the authenticator
//! that resolves a caller from one.

pub mod manager;
pub mod storage;
pub mod types;

pub use manager::SessionAuthenticator;
pub use storage::SessionStore;
pub use types::*;

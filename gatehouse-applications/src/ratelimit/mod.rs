//! Rate Limiting Module
//!
//! Token-bucket limiting keyed by `"<policy>:<client>"`, with idle buckets
//! evicted by a background sweeper.

pub mod bucket;
pub mod limiter;
pub mod store;
pub mod sweeper;
pub mod types;

pub use bucket::TokenBucket;
pub use limiter::RateLimiter;
pub use store::BucketStore;
pub use sweeper::{IdleBucketSweep, MaintenanceSweeper, Sweep, SweeperHandle};
pub use types::*;

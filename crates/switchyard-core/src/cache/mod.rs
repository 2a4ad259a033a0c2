//! Response memoization.
//!
//! - `BoundedMap`: capacity-bounded ordered map shared with the conversation store
//! - `CacheManager`: TTL cache with proactive expiry and stampede protection

pub mod bounded;
pub mod manager;

pub use bounded::{BoundedMap, EvictionPolicy};
pub use manager::CacheManager;

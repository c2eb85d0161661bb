//! Cache Module
//!
//! Per-credential-type caches of verified claims with TTL expiry and LRU eviction.

mod entry;
mod lru;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use registry::{CacheRegistry, CredentialTypeId};
pub use stats::CacheStats;
pub use store::TokenCache;

//! Cache Registry Module
//!
//! One `TokenCache` per credential type, created lazily on first lookup.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::info;

use crate::cache::{CacheStats, TokenCache};
use crate::error::RegistryError;

static GLOBAL_REGISTRY: Lazy<CacheRegistry> = Lazy::new(CacheRegistry::new);

// == Credential Type Id ==
/// Stable key selecting the cache that belongs to one claims/verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialTypeId(String);

impl CredentialTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the identifier from the fully qualified name of the claims type.
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<C>().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object-safe view of a `TokenCache<C>` with the claims type erased.
trait ErasedCache: Send + Sync {
    fn stats(&self) -> CacheStats;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<C: Send + Sync + 'static> ErasedCache for TokenCache<C> {
    fn stats(&self) -> CacheStats {
        TokenCache::stats(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

// == Cache Registry ==
/// Maps credential type identifiers to their dedicated caches.
///
/// Creation is an atomic get-or-insert: concurrent first callers for the same
/// identifier all receive the same instance. The capacity and TTL of the first
/// caller win; later arguments are ignored.
#[derive(Default)]
pub struct CacheRegistry {
    caches: DashMap<CredentialTypeId, Arc<dyn ErasedCache>>,
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.caches.len())
            .finish()
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry for callers that do not inject their own.
    pub fn global() -> &'static CacheRegistry {
        &GLOBAL_REGISTRY
    }

    // == Get Cache ==
    /// Returns the cache for `type_id`, creating it with `capacity` and `ttl`
    /// if this is the first request for that identifier.
    pub fn get_cache<C: Send + Sync + 'static>(
        &self,
        type_id: &CredentialTypeId,
        capacity: usize,
        ttl: Option<Duration>,
    ) -> Result<Arc<TokenCache<C>>, RegistryError> {
        let erased = match self.caches.entry(type_id.clone()) {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                let size = if capacity == 0 {
                    "unlimited".to_string()
                } else {
                    capacity.to_string()
                };
                info!(
                    type_id = %type_id,
                    capacity = %size,
                    ttl_secs = ?ttl.map(|ttl| ttl.as_secs_f64()),
                    "Creating token cache"
                );
                let cache: Arc<dyn ErasedCache> = Arc::new(TokenCache::<C>::new(capacity, ttl));
                Arc::clone(vacant.insert(cache).value())
            }
        };

        erased
            .into_any()
            .downcast::<TokenCache<C>>()
            .map_err(|_| RegistryError::TypeMismatch {
                type_id: type_id.clone(),
                requested: std::any::type_name::<C>(),
            })
    }

    /// Convenience lookup keyed by the claims type name.
    pub fn get_cache_for<C: Send + Sync + 'static>(
        &self,
        capacity: usize,
        ttl: Option<Duration>,
    ) -> Result<Arc<TokenCache<C>>, RegistryError> {
        self.get_cache(&CredentialTypeId::of::<C>(), capacity, ttl)
    }

    // == Stats ==
    /// Snapshot of every cache's counters, ordered by identifier.
    pub fn stats(&self) -> Vec<(CredentialTypeId, CacheStats)> {
        let mut all: Vec<_> = self
            .caches
            .iter()
            .map(|item| (item.key().clone(), item.value().stats()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

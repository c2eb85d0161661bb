//! Cache Entry Module
//!
//! Defines the record stored for each verified token.

use std::sync::Arc;
use std::time::{Duration, Instant};

// == Cache Entry ==
/// Verified claims together with the moment they were verified.
///
/// Both fields are fixed at construction. Claims are shared behind an `Arc`
/// so readers get a handle to the cached value without being able to mutate it.
#[derive(Debug)]
pub struct CacheEntry<C> {
    claims: Arc<C>,
    created_at: Instant,
}

impl<C> Clone for CacheEntry<C> {
    fn clone(&self) -> Self {
        Self {
            claims: Arc::clone(&self.claims),
            created_at: self.created_at,
        }
    }
}

impl<C> CacheEntry<C> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(claims: C) -> Self {
        Self::with_created_at(Arc::new(claims), Instant::now())
    }

    pub(crate) fn with_created_at(claims: Arc<C>, created_at: Instant) -> Self {
        Self { claims, created_at }
    }

    /// Returns a shared handle to the cached claims.
    pub fn claims(&self) -> Arc<C> {
        Arc::clone(&self.claims)
    }

    /// Returns when the claims were verified.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    // == Age ==
    /// Time elapsed between creation and `now`, saturating at zero.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived `ttl` as of `now`.
    ///
    /// Boundary condition: an entry whose age equals the TTL is already stale.
    /// A `None` TTL never goes stale.
    pub fn is_stale_at(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => self.age_at(now) >= ttl,
            None => false,
        }
    }
}

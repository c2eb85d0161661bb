//! Response DTOs for the demo API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::auth::StandardClaims;
use crate::cache::{CacheStats, CredentialTypeId};

/// Response body for GET /me
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Authenticated subject
    pub subject: String,
    /// Claims expiry (Unix epoch seconds), if the token carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

impl From<&StandardClaims> for MeResponse {
    fn from(claims: &StandardClaims) -> Self {
        Self {
            subject: claims.sub.clone(),
            expires_at: claims.exp,
            issuer: claims.iss.clone(),
        }
    }
}

/// Counters for one credential type's cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub type_id: String,
    pub hits: u64,
    pub misses: u64,
    pub stale: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl CacheStatsResponse {
    pub fn new(type_id: &CredentialTypeId, stats: &CacheStats) -> Self {
        Self {
            type_id: type_id.to_string(),
            hits: stats.hits,
            misses: stats.misses,
            stale: stats.stale,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub caches: Vec<CacheStatsResponse>,
}

impl StatsResponse {
    pub fn new(stats: &[(CredentialTypeId, CacheStats)]) -> Self {
        Self {
            caches: stats
                .iter()
                .map(|(type_id, stats)| CacheStatsResponse::new(type_id, stats))
                .collect(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

//! API Handlers
//!
//! Application state and HTTP request handlers for the demo server.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use crate::auth::{Authenticator, JwtVerifier, StandardClaims};
use crate::cache::{CacheRegistry, CredentialTypeId};
use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{HealthResponse, MeResponse, StatsResponse};

/// JWT authenticator over the standard claims set.
pub type JwtAuthenticator = Authenticator<StandardClaims, JwtVerifier<StandardClaims>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authenticator for the `JWT` credential type
    pub authenticator: Arc<JwtAuthenticator>,
    /// Registry holding every credential type's cache
    pub registry: Arc<CacheRegistry>,
}

impl AppState {
    /// Creates a new AppState with its own registry.
    pub fn new(authenticator: JwtAuthenticator, registry: Arc<CacheRegistry>) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            registry,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the verifier from the configured key and registers the JWT
    /// credential type's cache.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let registry = Arc::new(CacheRegistry::new());
        let verifier = JwtVerifier::new(&config.jwt)?;
        let authenticator = Authenticator::new(
            &registry,
            CredentialTypeId::new(config.auth.type_value.clone()),
            config.auth.clone(),
            verifier,
        )?;
        Ok(Self::new(authenticator, registry))
    }
}

/// Handler for GET /me
///
/// Returns the authenticated caller's claims summary. Only reachable through
/// the credential middleware.
pub async fn me_handler(Extension(claims): Extension<Arc<StandardClaims>>) -> Json<MeResponse> {
    Json(MeResponse::from(claims.as_ref()))
}

/// Handler for GET /stats
///
/// Returns cache statistics for every registered credential type.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(&state.registry.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_me_handler() {
        let claims = Arc::new(StandardClaims::new("alice").with_expiry(42));
        let response = me_handler(Extension(claims)).await;
        assert_eq!(response.subject, "alice");
        assert_eq!(response.expires_at, Some(42));
    }

    #[tokio::test]
    async fn test_stats_handler_lists_jwt_cache() {
        let state = AppState::from_config(&Config::with_secret("handler-secret")).unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.caches.len(), 1);
        assert_eq!(response.caches[0].type_id, "JWT");
        assert_eq!(response.caches[0].hits, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_from_config_rejects_empty_secret() {
        let result = AppState::from_config(&Config::with_secret(""));
        assert!(matches!(result, Err(ConfigError::Verifier(_))));
    }
}

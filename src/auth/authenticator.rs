//! Request-level authentication.
//!
//! Reads the scheme selector and `Authorization` headers, answers from the
//! credential type's token cache when possible, and otherwise verifies the
//! token and caches the result.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::instrument;

use crate::auth::verifier::expiry_cutoff;
use crate::auth::{ClaimVerifier, TokenClaims};
use crate::cache::{CacheRegistry, CredentialTypeId, TokenCache};
use crate::config::AuthSettings;
use crate::error::{AuthError, RegistryError, Result};

// == Rejection ==
/// Optional status and detail map attached to a failed or skipped attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rejection {
    pub status: Option<StatusCode>,
    pub details: Option<HashMap<String, String>>,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::UNAUTHORIZED);
        let body = match self.details {
            Some(details) => json!({ "error": "unauthorized", "details": details }),
            None => json!({ "error": "unauthorized" }),
        };
        (status, Json(body)).into_response()
    }
}

// == Auth Outcome ==
/// Result of one authentication attempt in a multi-handler credential chain.
///
/// `Skip` means the request does not use this credential type and another
/// handler may try it. `Failure` is terminal for this attempt.
#[derive(Debug)]
pub enum AuthOutcome<C> {
    Success(Arc<C>),
    Failure(Rejection),
    Skip(Rejection),
}

impl<C> AuthOutcome<C> {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }

    pub fn claims(&self) -> Option<&Arc<C>> {
        match self {
            AuthOutcome::Success(claims) => Some(claims),
            _ => None,
        }
    }
}

/// Splits `"<scheme> <token>"` and returns the token.
///
/// Runs of spaces are ignored. Exactly two parts are required and the scheme
/// must match exactly.
pub fn parse_credentials<'a>(header_value: &'a str, scheme: &str) -> Option<&'a str> {
    let mut parts = header_value.split(' ').filter(|part| !part.is_empty());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(found), Some(token), None) if found == scheme => Some(token),
        _ => None,
    }
}

// == Authenticator ==
/// Authenticates requests for one credential type.
pub struct Authenticator<C, V> {
    type_id: CredentialTypeId,
    settings: AuthSettings,
    cache: Arc<TokenCache<C>>,
    verifier: V,
}

impl<C, V> Authenticator<C, V>
where
    C: TokenClaims,
    V: ClaimVerifier<C>,
{
    /// Binds the authenticator to the cache registered for `type_id`.
    ///
    /// The cache is created with `settings.cache_size` and `settings.token_ttl`
    /// unless another authenticator registered it first.
    pub fn new(
        registry: &CacheRegistry,
        type_id: CredentialTypeId,
        settings: AuthSettings,
        verifier: V,
    ) -> std::result::Result<Self, RegistryError> {
        let cache = registry.get_cache::<C>(&type_id, settings.cache_size, settings.token_ttl)?;
        Ok(Self {
            type_id,
            settings,
            cache,
            verifier,
        })
    }

    pub fn type_id(&self) -> &CredentialTypeId {
        &self.type_id
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<TokenCache<C>> {
        &self.cache
    }

    /// Runs the attempt and reports it on the success, failure, or skip channel.
    ///
    /// Failures carry no status or details so a bad token looks the same as a
    /// missing one.
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthOutcome<C> {
        match self.check(headers) {
            Ok(claims) => AuthOutcome::Success(claims),
            Err(AuthError::SchemeNotAsserted) => AuthOutcome::Skip(Rejection::default()),
            Err(_) => AuthOutcome::Failure(Rejection::default()),
        }
    }

    /// Same as `authenticate` with the failure reason kept.
    #[instrument(skip_all, name = "claims_cache.auth", fields(type_id = %self.type_id))]
    pub fn check(&self, headers: &HeaderMap) -> Result<Arc<C>> {
        let asserted = headers
            .get(self.settings.type_header.as_str())
            .and_then(|value| value.to_str().ok());
        if asserted != Some(self.settings.type_value.as_str()) {
            return Err(AuthError::SchemeNotAsserted);
        }

        let credentials = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| {
                tracing::debug!("Missing Authorization header");
                AuthError::CredentialMissing
            })?
            .to_str()
            .map_err(|_| AuthError::CredentialMalformed)?;

        let token = parse_credentials(credentials, &self.settings.scheme).ok_or_else(|| {
            tracing::debug!("Invalid Authorization header format");
            AuthError::CredentialMalformed
        })?;

        let cached = if self.settings.recheck_claims_expiry {
            let cutoff = expiry_cutoff(chrono::Utc::now().timestamp(), self.verifier.leeway_secs());
            self.cache.get_if(token, |claims| !claims.is_expired_at(cutoff))
        } else {
            self.cache.get(token)
        };
        if let Some(claims) = cached {
            return Ok(claims);
        }

        let claims = Arc::new(self.verifier.verify(token)?);
        self.cache.insert(token, Arc::clone(&claims));
        tracing::debug!("Token verified and cached");
        Ok(claims)
    }
}

//! Error types for token authentication
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::CredentialTypeId;

// == Verification Error ==
/// Why a raw token could not be turned into claims.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Wrong part count, bad encoding, or undecodable payload
    #[error("token is malformed")]
    Malformed,

    /// Token header names an algorithm other than the configured one
    #[error("token algorithm does not match the configured scheme")]
    SchemeMismatch,

    /// Signature does not verify against the configured key
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Embedded expiry has passed
    #[error("token claims have expired")]
    ClaimsExpired,

    /// Issuer, audience, or not-before checks failed
    #[error("token claims were rejected")]
    ClaimsRejected,

    /// Configured key material cannot be used with the configured algorithm
    #[error("verification key is invalid: {0}")]
    InvalidKey(String),
}

// == Registry Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The identifier is already bound to a cache holding a different claims type
    #[error("cache for credential type '{type_id}' does not hold {requested}")]
    TypeMismatch {
        type_id: CredentialTypeId,
        requested: &'static str,
    },
}

// == Auth Error ==
/// Outcome taxonomy for one authentication attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Request does not declare this credential scheme
    #[error("credential scheme not asserted")]
    SchemeNotAsserted,

    /// Scheme declared but no credential supplied
    #[error("credential missing")]
    CredentialMissing,

    /// Credential header has the wrong shape or scheme prefix
    #[error("credential malformed")]
    CredentialMalformed,

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("claims expired")]
    ClaimsExpired,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<VerificationError> for AuthError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::SignatureInvalid => AuthError::SignatureInvalid,
            VerificationError::ClaimsExpired => AuthError::ClaimsExpired,
            VerificationError::Malformed
            | VerificationError::SchemeMismatch
            | VerificationError::ClaimsRejected
            | VerificationError::InvalidKey(_) => AuthError::CredentialMalformed,
        }
    }
}

// == IntoResponse Implementation ==
/// Every credential problem renders the same 401 body so clients cannot tell
/// a bad token from a missing one.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Registry(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
            _ => (StatusCode::UNAUTHORIZED, "unauthorized"),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Config Error ==
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error(transparent)]
    Verifier(#[from] VerificationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// == Result Type Alias ==
/// Convenience Result type for authentication.
pub type Result<T> = std::result::Result<T, AuthError>;

//! Claims Cache - bearer token authentication with cached verification
//!
//! Verifies a bearer token once, caches the resulting claims per credential
//! type, and answers repeat requests from the cache until the entry ages out
//! or is evicted.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use auth::{AuthOutcome, Authenticator, ClaimVerifier, JwtVerifier, StandardClaims, TokenClaims};
pub use cache::{CacheRegistry, CredentialTypeId, TokenCache};
pub use config::Config;

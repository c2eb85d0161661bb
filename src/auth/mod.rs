//! Authentication Module
//!
//! Bearer token extraction, signature verification, and the cached
//! request-level authentication flow.

mod authenticator;
mod claims;
mod verifier;

pub use authenticator::{parse_credentials, AuthOutcome, Authenticator, Rejection};
pub use claims::{StandardClaims, TokenClaims};
pub use verifier::{ClaimVerifier, JwtVerifier, MAX_TOKEN_SIZE_BYTES};

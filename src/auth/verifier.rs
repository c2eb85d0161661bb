//! Token signature verification.
//!
//! # Security
//!
//! - Tokens are size-checked before parsing
//! - Only the configured algorithm is accepted
//! - Expiry is validated with the configured leeway
//! - Failures are logged at debug level without the token itself

use std::marker::PhantomData;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::auth::TokenClaims;
use crate::config::JwtSettings;
use crate::error::VerificationError;

/// Maximum accepted token size in bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Parses a raw token and checks its signature, producing claims.
///
/// Implementations are stateless apart from their key configuration and must
/// be safe to call from many request handlers at once.
pub trait ClaimVerifier<C>: Send + Sync {
    fn verify(&self, raw_token: &str) -> Result<C, VerificationError>;

    /// Clock skew tolerated when checking embedded expiry.
    fn leeway_secs(&self) -> u64 {
        0
    }
}

/// Latest `exp` that still counts as expired at `now` under `leeway_secs`.
pub(crate) fn expiry_cutoff(now: i64, leeway_secs: u64) -> i64 {
    now.saturating_sub(i64::try_from(leeway_secs).unwrap_or(i64::MAX))
}

/// JWT verifier for a single algorithm and key.
pub struct JwtVerifier<C> {
    decoding_key: DecodingKey,
    validation: Validation,
    _claims: PhantomData<fn() -> C>,
}

impl<C> JwtVerifier<C> {
    /// Builds a verifier from settings.
    ///
    /// HMAC algorithms use the key bytes directly. RSA, ECDSA and EdDSA
    /// algorithms expect a PEM-encoded public key.
    pub fn new(settings: &JwtSettings) -> Result<Self, VerificationError> {
        let decoding_key = decoding_key(settings.algorithm, settings.key.expose_secret())?;

        let mut validation = Validation::new(settings.algorithm);
        validation.leeway = settings.leeway_secs;
        validation.validate_exp = true;
        // exp is checked when present; claims types without one are allowed
        validation.required_spec_claims.clear();
        if let Some(issuer) = &settings.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &settings.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key,
            validation,
            _claims: PhantomData,
        })
    }
}

fn decoding_key(algorithm: Algorithm, key: &str) -> Result<DecodingKey, VerificationError> {
    let invalid = |e: jsonwebtoken::errors::Error| VerificationError::InvalidKey(e.to_string());
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            if key.is_empty() {
                return Err(VerificationError::InvalidKey("empty HMAC secret".to_string()));
            }
            Ok(DecodingKey::from_secret(key.as_bytes()))
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(key.as_bytes()).map_err(invalid),
        Algorithm::ES256 | Algorithm::ES384 => {
            DecodingKey::from_ec_pem(key.as_bytes()).map_err(invalid)
        }
        Algorithm::EdDSA => DecodingKey::from_ed_pem(key.as_bytes()).map_err(invalid),
    }
}

fn classify(kind: &ErrorKind) -> VerificationError {
    match kind {
        ErrorKind::InvalidSignature => VerificationError::SignatureInvalid,
        ErrorKind::ExpiredSignature => VerificationError::ClaimsExpired,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            VerificationError::SchemeMismatch
        }
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => VerificationError::ClaimsRejected,
        _ => VerificationError::Malformed,
    }
}

impl<C: TokenClaims> ClaimVerifier<C> for JwtVerifier<C> {
    #[instrument(skip_all, name = "claims_cache.auth.verify")]
    fn verify(&self, raw_token: &str) -> Result<C, VerificationError> {
        if raw_token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(size = raw_token.len(), "Token exceeds maximum size");
            return Err(VerificationError::Malformed);
        }
        if raw_token.split('.').count() != 3 {
            tracing::debug!("Token does not have three parts");
            return Err(VerificationError::Malformed);
        }

        let data = decode::<C>(raw_token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            classify(e.kind())
        })?;

        // jsonwebtoken skips exp values that do not fit a u64
        let cutoff = expiry_cutoff(chrono::Utc::now().timestamp(), self.validation.leeway);
        if data.claims.is_expired_at(cutoff) {
            tracing::debug!("Token claims past their expiry");
            return Err(VerificationError::ClaimsExpired);
        }

        Ok(data.claims)
    }

    fn leeway_secs(&self) -> u64 {
        self.validation.leeway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StandardClaims;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "unit-test-secret";

    fn verifier() -> JwtVerifier<StandardClaims> {
        JwtVerifier::new(&JwtSettings::new(Algorithm::HS256, SECRET)).unwrap()
    }

    fn sign(claims: &StandardClaims, alg: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token() {
        let claims = StandardClaims::new("alice").with_expiry(future_exp());
        let token = sign(&claims, Algorithm::HS256, SECRET);

        let verified = verifier().verify(&token).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn test_token_without_exp_is_accepted() {
        let claims = StandardClaims::new("alice");
        let token = sign(&claims, Algorithm::HS256, SECRET);

        assert_eq!(verifier().verify(&token).unwrap().sub, "alice");
    }

    #[test]
    fn test_wrong_key_is_signature_invalid() {
        let claims = StandardClaims::new("alice").with_expiry(future_exp());
        let token = sign(&claims, Algorithm::HS256, "some-other-secret");

        assert_eq!(
            verifier().verify(&token),
            Err(VerificationError::SignatureInvalid)
        );
    }

    #[test]
    fn test_expired_token() {
        let claims = StandardClaims::new("alice").with_expiry(chrono::Utc::now().timestamp() - 600);
        let token = sign(&claims, Algorithm::HS256, SECRET);

        assert_eq!(verifier().verify(&token), Err(VerificationError::ClaimsExpired));
    }

    #[test]
    fn test_negative_exp_is_expired() {
        let claims = StandardClaims::new("alice").with_expiry(-1);
        let token = sign(&claims, Algorithm::HS256, SECRET);

        assert_eq!(verifier().verify(&token), Err(VerificationError::ClaimsExpired));
    }

    #[test]
    fn test_leeway_accepts_recently_expired() {
        let mut settings = JwtSettings::new(Algorithm::HS256, SECRET);
        settings.leeway_secs = 60;
        let verifier: JwtVerifier<StandardClaims> = JwtVerifier::new(&settings).unwrap();
        assert_eq!(verifier.leeway_secs(), 60);

        let claims = StandardClaims::new("alice").with_expiry(chrono::Utc::now().timestamp() - 5);
        let token = sign(&claims, Algorithm::HS256, SECRET);

        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_expiry_cutoff() {
        assert_eq!(expiry_cutoff(1_000, 0), 1_000);
        assert_eq!(expiry_cutoff(1_000, 60), 940);
        assert_eq!(expiry_cutoff(i64::MIN, 1), i64::MIN);
        assert_eq!(expiry_cutoff(0, u64::MAX), -i64::MAX);
    }

    #[test]
    fn test_algorithm_mismatch() {
        let claims = StandardClaims::new("alice").with_expiry(future_exp());
        let token = sign(&claims, Algorithm::HS512, SECRET);

        assert_eq!(verifier().verify(&token), Err(VerificationError::SchemeMismatch));
    }

    #[test]
    fn test_malformed_tokens() {
        let verifier = verifier();
        for raw in ["", "garbage", "only.two", "a.b.c.d", "!!!.@@@.###"] {
            assert_eq!(
                verifier.verify(raw),
                Err(VerificationError::Malformed),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_oversized_token() {
        let raw = format!("{}.b.c", "a".repeat(MAX_TOKEN_SIZE_BYTES));
        assert_eq!(verifier().verify(&raw), Err(VerificationError::Malformed));
    }

    #[test]
    fn test_issuer_checked_when_configured() {
        let mut settings = JwtSettings::new(Algorithm::HS256, SECRET);
        settings.issuer = Some("https://issuer.example".to_string());
        let verifier: JwtVerifier<StandardClaims> = JwtVerifier::new(&settings).unwrap();

        let mut claims = StandardClaims::new("alice").with_expiry(future_exp());
        claims.iss = Some("https://elsewhere.example".to_string());
        let token = sign(&claims, Algorithm::HS256, SECRET);
        assert_eq!(verifier.verify(&token), Err(VerificationError::ClaimsRejected));

        claims.iss = Some("https://issuer.example".to_string());
        let token = sign(&claims, Algorithm::HS256, SECRET);
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_empty_hmac_secret_rejected() {
        let result = JwtVerifier::<StandardClaims>::new(&JwtSettings::new(Algorithm::HS256, ""));
        assert!(matches!(result, Err(VerificationError::InvalidKey(_))));
    }

    #[test]
    fn test_bad_pem_rejected() {
        let result =
            JwtVerifier::<StandardClaims>::new(&JwtSettings::new(Algorithm::RS256, "not a pem"));
        assert!(matches!(result, Err(VerificationError::InvalidKey(_))));
    }
}

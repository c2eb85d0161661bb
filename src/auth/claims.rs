//! Claims types carried by verified tokens.
//!
//! Any deserializable type can be cached; `TokenClaims` only asks whether the
//! claims embed their own expiry. The `sub` field of `StandardClaims` is
//! redacted in Debug output so identifiers stay out of logs.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Claims that can be produced by a verifier and held in a token cache.
pub trait TokenClaims: DeserializeOwned + Send + Sync + 'static {
    /// Expiry as Unix epoch seconds, if the claims carry one.
    fn expires_at(&self) -> Option<i64> {
        None
    }

    /// Whether the embedded expiry has passed at `now` (Unix epoch seconds).
    fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// Registered JWT claims plus any additional fields.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardClaims {
    /// Subject (user or client id) - redacted in Debug output.
    pub sub: String,

    /// Expiration time (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at time (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience, either a single string or an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,

    /// Fields outside the registered set.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl fmt::Debug for StandardClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardClaims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StandardClaims {
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            exp: None,
            iat: None,
            iss: None,
            aud: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }
}

impl TokenClaims for StandardClaims {
    fn expires_at(&self) -> Option<i64> {
        self.exp
    }
}

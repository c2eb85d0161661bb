//! Configuration Module
//!
//! Loads authentication and server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use secrecy::SecretString;

use crate::error::ConfigError;

/// How JWTs are verified. The key is never embedded in the binary.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    /// Expected signing algorithm
    pub algorithm: Algorithm,
    /// HMAC secret for HS* algorithms, PEM public key otherwise
    pub key: SecretString,
    /// Clock skew tolerance for exp/nbf checks, in seconds
    pub leeway_secs: u64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl JwtSettings {
    pub fn new(algorithm: Algorithm, key: impl Into<String>) -> Self {
        Self {
            algorithm,
            key: SecretString::from(key.into()),
            leeway_secs: 0,
            issuer: None,
            audience: None,
        }
    }
}

/// Per-credential-type authentication settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Header that declares which credential scheme a request uses
    pub type_header: String,
    /// Value of `type_header` selecting this credential type
    pub type_value: String,
    /// Authorization scheme prefix, e.g. `Bearer`
    pub scheme: String,
    /// Maximum cached tokens, 0 for unbounded
    pub cache_size: usize,
    /// Maximum age of a cached verification, `None` for no expiry
    pub token_ttl: Option<Duration>,
    /// Re-check the claims' own `exp` on every cache hit
    pub recheck_claims_expiry: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            type_header: "X-token-type".to_string(),
            type_value: "JWT".to_string(),
            scheme: "Bearer".to_string(),
            cache_size: 0,
            token_ttl: None,
            recheck_claims_expiry: true,
        }
    }
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    pub auth: AuthSettings,
    pub jwt: JwtSettings,
}

impl Config {
    /// Builds a config with default settings around the given HS256 secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            server_port: 3000,
            auth: AuthSettings::default(),
            jwt: JwtSettings::new(Algorithm::HS256, secret),
        }
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `TOKEN_TYPE_HEADER` - Scheme selector header (default: X-token-type)
    /// - `TOKEN_TYPE` - Scheme selector value (default: JWT)
    /// - `AUTH_SCHEME` - Authorization prefix (default: Bearer)
    /// - `TOKEN_CACHE_SIZE` - Maximum cached tokens, 0 = unlimited (default: 0)
    /// - `TOKEN_TTL_SECS` - Cache entry lifetime (default: unset, never expires)
    /// - `RECHECK_CLAIMS_EXPIRY` - Check `exp` on cache hits (default: true)
    /// - `JWT_ALGORITHM` - Signing algorithm (default: HS256)
    /// - `JWT_SECRET` - Key material (required)
    /// - `JWT_LEEWAY_SECS` - Clock skew tolerance (default: 0)
    /// - `JWT_ISSUER`, `JWT_AUDIENCE` - Optional expected values
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AuthSettings::default();

        let auth = AuthSettings {
            type_header: var_or("TOKEN_TYPE_HEADER", defaults.type_header),
            type_value: var_or("TOKEN_TYPE", defaults.type_value),
            scheme: var_or("AUTH_SCHEME", defaults.scheme),
            cache_size: parse_var("TOKEN_CACHE_SIZE")?.unwrap_or(defaults.cache_size),
            token_ttl: parse_var::<u64>("TOKEN_TTL_SECS")?.map(Duration::from_secs),
            recheck_claims_expiry: parse_var("RECHECK_CLAIMS_EXPIRY")?
                .unwrap_or(defaults.recheck_claims_expiry),
        };

        let algorithm = match optional_var("JWT_ALGORITHM") {
            Some(name) => Algorithm::from_str(&name).map_err(|e| ConfigError::Invalid {
                name: "JWT_ALGORITHM",
                reason: e.to_string(),
            })?,
            None => Algorithm::HS256,
        };
        let key = optional_var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt = JwtSettings {
            algorithm,
            key: SecretString::from(key),
            leeway_secs: parse_var("JWT_LEEWAY_SECS")?.unwrap_or(0),
            issuer: optional_var("JWT_ISSUER"),
            audience: optional_var("JWT_AUDIENCE"),
        };

        Ok(Self {
            server_port: parse_var("SERVER_PORT")?.unwrap_or(3000),
            auth,
            jwt,
        })
    }
}

/// Reads a variable, treating unset and empty the same.
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn var_or(name: &str, default: String) -> String {
    optional_var(name).unwrap_or(default)
}

fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(name)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        })
        .transpose()
}

//! JWT token strategy
//!
//! Verifies compact JWS tokens (`header.payload.signature`) signed with one of
//! the configured HMAC keys, then checks `exp`/`nbf` with the configured
//! leeway.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::{Sha256, Sha384, Sha512};
use tracing::debug;

use super::manager::{Manager, ManagerBuildError, StrategyKind};

const SUPPORTED_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// A signing algorithm and its key
#[derive(Debug, Clone, Deserialize)]
pub struct SigningMethod {
    pub alg: String,
    pub key: String,
}

/// Settings for the `jwt` strategy
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub signing_methods: Vec<SigningMethod>,
    /// Allowed clock skew in seconds
    #[serde(default)]
    pub leeway: i64,
}

/// Locally validating manager for HMAC signed JWTs
pub struct JwtManager {
    signing_methods: Vec<SigningMethod>,
    leeway: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // keys stay out of logs
        let algs: Vec<_> = self.signing_methods.iter().map(|m| m.alg.as_str()).collect();
        f.debug_struct("JwtManager")
            .field("algorithms", &algs)
            .field("leeway", &self.leeway)
            .finish()
    }
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

impl JwtManager {
    pub fn new(settings: JwtSettings) -> Result<Self, ManagerBuildError> {
        let misconfigured = |reason: String| ManagerBuildError::Misconfigured {
            kind: StrategyKind::Jwt,
            reason,
        };

        if settings.signing_methods.is_empty() {
            return Err(misconfigured("at least one signing method is required".into()));
        }
        for method in &settings.signing_methods {
            if !SUPPORTED_ALGORITHMS.contains(&method.alg.as_str()) {
                return Err(misconfigured(format!("unsupported algorithm '{}'", method.alg)));
            }
            if method.key.is_empty() {
                return Err(misconfigured(format!("empty key for {}", method.alg)));
            }
        }
        if settings.leeway < 0 {
            return Err(misconfigured("leeway must not be negative".into()));
        }

        Ok(Self {
            signing_methods: settings.signing_methods,
            leeway: settings.leeway,
        })
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> Option<serde_json::Value> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            debug!("[JwtManager] Invalid token format - expected 3 parts");
            return None;
        };

        let header: Header = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).ok()?).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;
        let signing_input = format!("{}.{}", header_b64, payload_b64);

        let verified = self
            .signing_methods
            .iter()
            .filter(|m| m.alg == header.alg)
            .any(|m| verify(&m.alg, m.key.as_bytes(), signing_input.as_bytes(), &signature));
        if !verified {
            debug!("[JwtManager] Invalid token signature");
            return None;
        }

        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload_b64).ok()?).ok()?;

        let now = chrono::Utc::now().timestamp();
        if let Some(exp) = claims.get("exp").and_then(|v| v.as_i64()) {
            if now > exp.saturating_add(self.leeway) {
                debug!("[JwtManager] Token expired at {}, now is {}", exp, now);
                return None;
            }
        }
        if let Some(nbf) = claims.get("nbf").and_then(|v| v.as_i64()) {
            if now.saturating_add(self.leeway) < nbf {
                debug!("[JwtManager] Token not valid before {}", nbf);
                return None;
            }
        }

        Some(claims)
    }
}

fn verify(alg: &str, key: &[u8], input: &[u8], signature: &[u8]) -> bool {
    macro_rules! verify_with {
        ($digest:ty) => {
            match Hmac::<$digest>::new_from_slice(key) {
                Ok(mut mac) => {
                    mac.update(input);
                    mac.verify_slice(signature).is_ok()
                }
                Err(_) => false,
            }
        };
    }

    match alg {
        "HS256" => verify_with!(Sha256),
        "HS384" => verify_with!(Sha384),
        "HS512" => verify_with!(Sha512),
        _ => false,
    }
}

#[async_trait]
impl Manager for JwtManager {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Jwt
    }

    async fn is_key_authorised(&self, access_token: &str) -> bool {
        self.validate(access_token).is_some()
    }
}

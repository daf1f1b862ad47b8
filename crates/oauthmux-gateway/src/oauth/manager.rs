//! Token manager abstraction and the default factory

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::basic::BasicManager;
use super::introspection::{IntrospectionManager, IntrospectionSettings};
use super::jwt::{JwtManager, JwtSettings};

/// Known token strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Self-contained HMAC signed tokens, checked locally
    Jwt,
    /// Opaque tokens, checked against the OAuth server
    Introspection,
    /// Opaque tokens passed through; the OAuth server is the authority
    Basic,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Jwt => "jwt",
            StrategyKind::Introspection => "introspection",
            StrategyKind::Basic => "basic",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy name not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown token strategy '{0}'")]
pub struct UnknownStrategyError(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jwt" => Ok(StrategyKind::Jwt),
            "introspection" => Ok(StrategyKind::Introspection),
            "basic" => Ok(StrategyKind::Basic),
            _ => Err(UnknownStrategyError(s.to_string())),
        }
    }
}

/// Manager construction failure (malformed strategy settings)
#[derive(Debug, Error)]
pub enum ManagerBuildError {
    #[error("invalid {kind} settings: {source}")]
    InvalidSettings {
        kind: StrategyKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("misconfigured {kind} strategy: {reason}")]
    Misconfigured { kind: StrategyKind, reason: String },
}

/// Token manager bound to one server's strategy.
///
/// One instance is shared by every route of its server, so implementations
/// must be safe to call concurrently.
#[async_trait]
pub trait Manager: Send + Sync + fmt::Debug {
    /// Strategy this manager implements
    fn kind(&self) -> StrategyKind;

    /// Whether the access token grants access
    async fn is_key_authorised(&self, access_token: &str) -> bool;
}

/// Builds managers for a strategy kind from raw settings
pub trait ManagerFactory: Send + Sync {
    fn build(
        &self,
        kind: StrategyKind,
        settings: &serde_json::Value,
    ) -> Result<Arc<dyn Manager>, ManagerBuildError>;
}

/// Factory for the built-in strategies
#[derive(Debug, Clone, Default)]
pub struct DefaultManagerFactory {
    http: reqwest::Client,
}

impl DefaultManagerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured HTTP client for introspection calls
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ManagerFactory for DefaultManagerFactory {
    fn build(
        &self,
        kind: StrategyKind,
        settings: &serde_json::Value,
    ) -> Result<Arc<dyn Manager>, ManagerBuildError> {
        match kind {
            StrategyKind::Jwt => {
                let settings: JwtSettings = parse_settings(kind, settings)?;
                Ok(Arc::new(JwtManager::new(settings)?))
            }
            StrategyKind::Introspection => {
                let settings: IntrospectionSettings = parse_settings(kind, settings)?;
                Ok(Arc::new(IntrospectionManager::new(
                    self.http.clone(),
                    settings,
                )?))
            }
            StrategyKind::Basic => Ok(Arc::new(BasicManager)),
        }
    }
}

fn parse_settings<T: serde::de::DeserializeOwned>(
    kind: StrategyKind,
    settings: &serde_json::Value,
) -> Result<T, ManagerBuildError> {
    serde_json::from_value(settings.clone())
        .map_err(|source| ManagerBuildError::InvalidSettings { kind, source })
}

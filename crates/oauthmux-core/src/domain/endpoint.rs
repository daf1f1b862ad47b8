//! Endpoint definition - a single proxied route exposed by the gateway
//!
//! An endpoint pairs a listen path on the gateway with one or more upstream
//! targets. Definitions come straight from the store, so they must pass
//! [`EndpointDefinition::validate`] before being installed in the route table.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Method wildcard accepted in `methods`
pub const ALL_METHODS: &str = "ALL";

/// HTTP methods an endpoint may be restricted to
const KNOWN_METHODS: &[&str] = &[
    "GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "CONNECT", "TRACE", ALL_METHODS,
];

/// Why an endpoint definition was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listen_path is required")]
    MissingListenPath,

    #[error("listen_path '{0}' must start with '/' and contain no whitespace")]
    InvalidListenPath(String),

    #[error("at least one upstream target is required")]
    MissingUpstream,

    #[error("upstream target '{target}' is invalid: {reason}")]
    InvalidUpstream { target: String, reason: String },

    #[error("unsupported method '{0}'")]
    InvalidMethod(String),
}

/// A single upstream target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Upstream URL (e.g. `http://auth.internal:8080/token`)
    pub target: String,

    /// Relative weight for weighted balancing
    #[serde(default)]
    pub weight: u32,
}

/// Upstream targets and how to balance between them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstreams {
    #[serde(default = "default_balancing")]
    pub balancing: String,

    #[serde(default)]
    pub targets: Vec<Target>,
}

fn default_balancing() -> String {
    "roundrobin".to_string()
}

impl Default for Upstreams {
    fn default() -> Self {
        Self {
            balancing: default_balancing(),
            targets: Vec::new(),
        }
    }
}

/// Proxy definition for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    /// Path the gateway listens on
    pub listen_path: String,

    /// Where matching requests are forwarded
    #[serde(default)]
    pub upstreams: Upstreams,

    /// Allowed methods; empty or `ALL` accepts any method
    #[serde(default)]
    pub methods: Vec<String>,

    /// Virtual hosts this endpoint answers for (empty = any)
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub strip_path: bool,

    #[serde(default)]
    pub append_path: bool,

    #[serde(default)]
    pub preserve_host: bool,
}

impl EndpointDefinition {
    /// Create a definition forwarding `listen_path` to a single upstream
    pub fn new(listen_path: impl Into<String>, upstream: impl Into<String>) -> Self {
        Self {
            listen_path: listen_path.into(),
            upstreams: Upstreams {
                balancing: default_balancing(),
                targets: vec![Target {
                    target: upstream.into(),
                    weight: 0,
                }],
            },
            methods: Vec::new(),
            hosts: Vec::new(),
            strip_path: false,
            append_path: false,
            preserve_host: false,
        }
    }

    /// Restrict the endpoint to the given methods
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the endpoint accepts every method
    pub fn allows_any_method(&self) -> bool {
        self.methods.is_empty()
            || self
                .methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(ALL_METHODS))
    }

    /// Self-check run before the endpoint is installed.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.listen_path.is_empty() {
            return Err(ValidationError::MissingListenPath);
        }
        if !self.listen_path.starts_with('/')
            || self.listen_path.chars().any(char::is_whitespace)
        {
            return Err(ValidationError::InvalidListenPath(self.listen_path.clone()));
        }

        if self.upstreams.targets.is_empty() {
            return Err(ValidationError::MissingUpstream);
        }
        for target in &self.upstreams.targets {
            validate_target(&target.target)?;
        }

        if let Some(bad) = self.methods.iter().find(|m| {
            !KNOWN_METHODS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(m))
        }) {
            return Err(ValidationError::InvalidMethod(bad.clone()));
        }

        Ok(())
    }
}

fn validate_target(target: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUpstream {
        target: target.to_string(),
        reason,
    };

    if target.is_empty() {
        return Err(invalid("target is empty".to_string()));
    }
    let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

//! OAuth server definition entity
//!
//! One definition describes an upstream OAuth server exposed through the
//! gateway: its CORS policy, rate limit, token strategy and the endpoints it
//! publishes. Any endpoint slot may be left out.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::endpoint::EndpointDefinition;

/// CORS policy applied to every endpoint of a server.
///
/// Credentials are always allowed, so there is no flag for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsMeta {
    /// Allowed origins (`*` allows any origin)
    #[serde(default)]
    pub domains: Vec<String>,

    /// Allowed methods
    #[serde(default)]
    pub methods: Vec<String>,

    /// Allowed request headers
    #[serde(default)]
    pub request_headers: Vec<String>,

    /// Response headers exposed to the browser
    #[serde(default)]
    pub exposed_headers: Vec<String>,
}

/// Rate limit policy in `<limit>-<period>` form, e.g. `10-S` or `100-H`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitMeta {
    #[serde(default)]
    pub limit: String,
}

/// Token strategy descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenStrategy {
    /// Strategy name (e.g. `jwt`, `introspection`, `basic`)
    pub name: String,

    /// Strategy specific settings, interpreted by the manager factory
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Token flow endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthEndpoints {
    #[serde(default)]
    pub authorize: Option<EndpointDefinition>,
    #[serde(default)]
    pub token: Option<EndpointDefinition>,
    #[serde(default)]
    pub introspect: Option<EndpointDefinition>,
    #[serde(default)]
    pub revoke: Option<EndpointDefinition>,
}

/// Client management endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEndpoints {
    #[serde(default)]
    pub create: Option<EndpointDefinition>,
    #[serde(default)]
    pub remove: Option<EndpointDefinition>,
}

/// The six endpoint slots of an OAuth server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Authorize,
    Token,
    Info,
    Revoke,
    ClientCreate,
    ClientRemove,
}

impl EndpointKind {
    /// Every slot, in registration order
    pub const ALL: [EndpointKind; 6] = [
        EndpointKind::Authorize,
        EndpointKind::Token,
        EndpointKind::Info,
        EndpointKind::Revoke,
        EndpointKind::ClientCreate,
        EndpointKind::ClientRemove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Authorize => "authorize",
            EndpointKind::Token => "token",
            EndpointKind::Info => "info",
            EndpointKind::Revoke => "revoke",
            EndpointKind::ClientCreate => "client_create",
            EndpointKind::ClientRemove => "client_remove",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth server definition as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthServerConfig {
    /// Unique server name
    pub name: String,

    #[serde(default, rename = "oauth_endpoints")]
    pub endpoints: OAuthEndpoints,

    #[serde(default, rename = "oauth_client_endpoints")]
    pub client_endpoints: ClientEndpoints,

    #[serde(default)]
    pub cors_meta: CorsMeta,

    #[serde(default)]
    pub rate_limit: RateLimitMeta,

    #[serde(default)]
    pub token_strategy: TokenStrategy,

    /// Known client secrets (client_id -> client_secret), used on the token endpoint
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}

impl OAuthServerConfig {
    /// Create an empty definition with the given name and token strategy
    pub fn new(name: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token_strategy: TokenStrategy {
                name: strategy.into(),
                settings: serde_json::Value::Null,
            },
            ..Default::default()
        }
    }

    pub fn with_rate_limit(mut self, limit: impl Into<String>) -> Self {
        self.rate_limit.limit = limit.into();
        self
    }

    pub fn with_cors_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_meta.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strategy_settings(mut self, settings: serde_json::Value) -> Self {
        self.token_strategy.settings = settings;
        self
    }

    pub fn with_secret(mut self, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(client_id.into(), secret.into());
        self
    }

    /// Set the endpoint for a slot (`None` clears it)
    pub fn with_endpoint(mut self, kind: EndpointKind, endpoint: Option<EndpointDefinition>) -> Self {
        *self.endpoint_slot_mut(kind) = endpoint;
        self
    }

    /// Endpoint configured for a slot, if any
    pub fn endpoint(&self, kind: EndpointKind) -> Option<&EndpointDefinition> {
        match kind {
            EndpointKind::Authorize => self.endpoints.authorize.as_ref(),
            EndpointKind::Token => self.endpoints.token.as_ref(),
            EndpointKind::Info => self.endpoints.introspect.as_ref(),
            EndpointKind::Revoke => self.endpoints.revoke.as_ref(),
            EndpointKind::ClientCreate => self.client_endpoints.create.as_ref(),
            EndpointKind::ClientRemove => self.client_endpoints.remove.as_ref(),
        }
    }

    fn endpoint_slot_mut(&mut self, kind: EndpointKind) -> &mut Option<EndpointDefinition> {
        match kind {
            EndpointKind::Authorize => &mut self.endpoints.authorize,
            EndpointKind::Token => &mut self.endpoints.token,
            EndpointKind::Info => &mut self.endpoints.introspect,
            EndpointKind::Revoke => &mut self.endpoints.revoke,
            EndpointKind::ClientCreate => &mut self.client_endpoints.create,
            EndpointKind::ClientRemove => &mut self.client_endpoints.remove,
        }
    }

    /// Secret registered for a client
    pub fn secret_for(&self, client_id: &str) -> Option<&str> {
        self.secrets.get(client_id).map(String::as_str)
    }
}

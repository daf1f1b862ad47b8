//! Middleware chain construction for one OAuth server

use std::sync::Arc;

use http::HeaderName;
use oauthmux_core::EndpointKind;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use super::cors::cors_layer;
use super::rate_limit::{Rate, RateLimitLayer, RateLimiter};
use super::secret::SecretLayer;
use super::{ChainLink, MiddlewareChain};
use crate::config::LoaderConfig;
use crate::oauth::OAuthSpec;

/// Builds per-endpoint middleware chains from a server's declarative settings
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChainBuilder {
    key_header: Option<HeaderName>,
    trust_forward_headers: bool,
}

impl MiddlewareChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        let key_header = config.rate_limit_key_header.as_deref().and_then(|name| {
            match HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes()) {
                Ok(header) => Some(header),
                Err(_) => {
                    warn!(
                        "[MiddlewareChainBuilder] Ignoring invalid rate limit key header '{}'",
                        name
                    );
                    None
                }
            }
        });
        Self {
            key_header,
            trust_forward_headers: config.trust_forward_headers,
        }
    }

    /// Key rate limit counters by `X-Forwarded-For` / `X-Real-IP`
    pub fn with_trust_forward_headers(mut self, trust: bool) -> Self {
        self.trust_forward_headers = trust;
        self
    }

    pub fn key_header(&self) -> Option<&HeaderName> {
        self.key_header.as_ref()
    }

    pub fn trusts_forward_headers(&self) -> bool {
        self.trust_forward_headers
    }

    /// Build the middleware shared by every endpoint of one server.
    ///
    /// A malformed rate is logged and replaced by [`Rate::ZERO`]; the server
    /// keeps loading.
    pub fn for_server(&self, spec: &Arc<OAuthSpec>) -> ServerMiddleware {
        let formatted = &spec.config().rate_limit.limit;
        let rate = match Rate::parse(formatted) {
            Ok(rate) => rate,
            Err(e) => {
                warn!(
                    server = %spec.name(),
                    error = %e,
                    "[MiddlewareChainBuilder] Not able to create rate limit, using zero rate"
                );
                Rate::ZERO
            }
        };
        debug!(server = %spec.name(), rate = %rate, "[MiddlewareChainBuilder] Rate limit configured");

        ServerMiddleware {
            spec: spec.clone(),
            cors: cors_layer(&spec.config().cors_meta),
            rate_limit: RateLimitLayer::new(Arc::new(RateLimiter::new(rate)))
                .with_key_header(self.key_header.clone())
                .with_trust_forward_headers(self.trust_forward_headers),
        }
    }

    /// Build the chain for a single endpoint kind
    pub fn build(&self, spec: &Arc<OAuthSpec>, kind: EndpointKind) -> MiddlewareChain {
        self.for_server(spec).chain(kind)
    }
}

/// CORS and rate limit layers of one server.
///
/// Every chain handed out by [`ServerMiddleware::chain`] shares the same
/// limiter counters.
#[derive(Debug, Clone)]
pub struct ServerMiddleware {
    spec: Arc<OAuthSpec>,
    cors: CorsLayer,
    rate_limit: RateLimitLayer,
}

impl ServerMiddleware {
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.rate_limit.limiter()
    }

    /// Chain for an endpoint kind: CORS, rate limit, then the client secret
    /// check on the token endpoint.
    pub fn chain(&self, kind: EndpointKind) -> MiddlewareChain {
        let mut links = vec![
            ChainLink::Cors(self.cors.clone()),
            ChainLink::RateLimit(self.rate_limit.clone()),
        ];
        if kind == EndpointKind::Token {
            links.push(ChainLink::Secret(SecretLayer::new(self.spec.clone())));
        }
        MiddlewareChain::new(links)
    }
}

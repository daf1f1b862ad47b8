//! Endpoint middleware chains
//!
//! Every registered OAuth endpoint is wrapped by an ordered, immutable chain:
//!
//! ```text
//! request ──► CORS ──► RateLimit ──► Secret (token endpoint only) ──► handler
//! ```
//!
//! CORS is outermost and the client secret check sits closest to the handler.

mod builder;
mod cors;
pub mod rate_limit;
mod secret;

pub use builder::{MiddlewareChainBuilder, ServerMiddleware};
pub use cors::cors_layer;
pub use rate_limit::{Rate, RateLimitLayer, RateLimiter, RateParseError};
pub use secret::SecretLayer;

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use http::{Request, Response};
use tower::util::BoxCloneSyncService;
use tower::Layer;
use tower_http::cors::CorsLayer;

/// Type-erased endpoint service
pub type BoxedService = BoxCloneSyncService<Request<Body>, Response<Body>, Infallible>;

/// Kind of a chain link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Cors,
    RateLimit,
    Secret,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkKind::Cors => "cors",
            LinkKind::RateLimit => "rate_limit",
            LinkKind::Secret => "secret",
        })
    }
}

/// One request-wrapping layer of a chain
#[derive(Debug, Clone)]
pub enum ChainLink {
    Cors(CorsLayer),
    RateLimit(RateLimitLayer),
    Secret(SecretLayer),
}

impl ChainLink {
    pub fn kind(&self) -> LinkKind {
        match self {
            ChainLink::Cors(_) => LinkKind::Cors,
            ChainLink::RateLimit(_) => LinkKind::RateLimit,
            ChainLink::Secret(_) => LinkKind::Secret,
        }
    }

    /// Wrap `inner` with this link
    pub fn wrap(&self, inner: BoxedService) -> BoxedService {
        match self {
            ChainLink::Cors(layer) => BoxCloneSyncService::new(layer.layer(inner)),
            ChainLink::RateLimit(layer) => BoxCloneSyncService::new(layer.layer(inner)),
            ChainLink::Secret(layer) => BoxCloneSyncService::new(layer.layer(inner)),
        }
    }
}

/// Ordered middleware chain, outermost link first
#[derive(Debug, Clone)]
pub struct MiddlewareChain {
    links: Arc<[ChainLink]>,
}

impl MiddlewareChain {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self {
            links: links.into(),
        }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Link kinds, outermost first
    pub fn kinds(&self) -> Vec<LinkKind> {
        self.links.iter().map(ChainLink::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, kind: LinkKind) -> bool {
        self.links.iter().any(|l| l.kind() == kind)
    }

    /// Wrap a handler so that the first link sees the request first
    pub fn apply(&self, handler: BoxedService) -> BoxedService {
        self.links
            .iter()
            .rev()
            .fold(handler, |inner, link| link.wrap(inner))
    }
}

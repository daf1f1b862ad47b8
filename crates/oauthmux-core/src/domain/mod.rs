//! Domain entities

mod endpoint;
mod oauth_server;

pub use endpoint::{EndpointDefinition, Target, Upstreams, ValidationError, ALL_METHODS};
pub use oauth_server::{
    ClientEndpoints, CorsMeta, EndpointKind, OAuthEndpoints, OAuthServerConfig, RateLimitMeta,
    TokenStrategy,
};

//! OAuthMux Gateway
//!
//! Turns stored OAuth server definitions into guarded gateway routes:
//! - Token strategy resolution (jwt, introspection, basic)
//! - Per-endpoint middleware chains (CORS, rate limiting, client secrets)
//! - Endpoint validation and route registration
//! - Load orchestration with per-server and per-endpoint fault isolation

pub mod config;
pub mod loader;
pub mod logging;
pub mod middleware;
pub mod oauth;
pub mod routing;

pub use config::LoaderConfig;
pub use loader::{
    Assembled, DefinitionAssembler, LoadError, LoadSummary, OAuthLoader, ServerSummary,
    SkippedServer,
};
pub use middleware::{
    BoxedService, ChainLink, LinkKind, MiddlewareChain, MiddlewareChainBuilder, Rate,
    RateLimiter, RateParseError, ServerMiddleware,
};
pub use oauth::{
    DefaultManagerFactory, Manager, ManagerBuildError, ManagerFactory, ManagerResolver,
    OAuthSpec, ResolveError, StrategyKind, UnknownStrategyError,
};
pub use routing::{InMemoryRouteTable, RegisterOutcome, Route, RouteRegistrar, RouteTable};

//! OAuth token strategies
//!
//! A server definition names its token strategy; the [`ManagerResolver`]
//! turns that name into a [`Manager`] through a [`ManagerFactory`]. Resolved
//! servers are carried through the pipeline as [`OAuthSpec`]s.

mod basic;
mod introspection;
mod jwt;
mod manager;
mod resolver;
mod spec;

pub use basic::BasicManager;
pub use introspection::{IntrospectionManager, IntrospectionSettings};
pub use jwt::{JwtManager, JwtSettings, SigningMethod};
pub use manager::{
    DefaultManagerFactory, Manager, ManagerBuildError, ManagerFactory, StrategyKind,
    UnknownStrategyError,
};
pub use resolver::{ManagerResolver, ResolveError};
pub use spec::OAuthSpec;

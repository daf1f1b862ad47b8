//! # OAuthMux Core Library
//!
//! Domain entities and data access traits for OAuthMux.
//!
//! ## Modules
//!
//! - `domain` - Core entities (OAuthServerConfig, EndpointDefinition, CorsMeta, RateLimitMeta)
//! - `repository` - Data access traits

pub mod domain;
pub mod repository;

// Re-export commonly used types
pub use domain::*;
pub use repository::*;

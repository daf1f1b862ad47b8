//! Repository traits for data access
//!
//! These traits define the interface for definition storage without
//! specifying the implementation (filesystem, in-memory, etc.)

use async_trait::async_trait;

use crate::domain::OAuthServerConfig;

/// Result type for repository operations
pub type RepoResult<T> = anyhow::Result<T>;

/// OAuth server definition repository trait
#[async_trait]
pub trait OAuthServerRepository: Send + Sync {
    /// Get all OAuth server definitions
    async fn find_all(&self) -> RepoResult<Vec<OAuthServerConfig>>;

    /// Get a definition by server name
    async fn find_by_name(&self, name: &str) -> RepoResult<Option<OAuthServerConfig>>;
}

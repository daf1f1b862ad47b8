//! In-memory implementation of OAuthServerRepository.

use anyhow::Result;
use async_trait::async_trait;
use oauthmux_core::{OAuthServerConfig, OAuthServerRepository};
use tokio::sync::RwLock;

/// In-memory definition store.
///
/// Keeps definitions in insertion order; adding a definition whose name
/// already exists replaces it in place.
#[derive(Default)]
pub struct InMemoryOAuthServerRepository {
    servers: RwLock<Vec<OAuthServerConfig>>,
}

impl InMemoryOAuthServerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with definitions
    pub fn with_servers(servers: Vec<OAuthServerConfig>) -> Self {
        Self {
            servers: RwLock::new(servers),
        }
    }

    /// Add or replace a definition
    pub async fn add(&self, server: OAuthServerConfig) {
        let mut servers = self.servers.write().await;
        match servers.iter_mut().find(|s| s.name == server.name) {
            Some(existing) => *existing = server,
            None => servers.push(server),
        }
    }

    /// Remove a definition by name, returning whether it existed
    pub async fn remove(&self, name: &str) -> bool {
        let mut servers = self.servers.write().await;
        let before = servers.len();
        servers.retain(|s| s.name != name);
        servers.len() != before
    }
}

#[async_trait]
impl OAuthServerRepository for InMemoryOAuthServerRepository {
    async fn find_all(&self) -> Result<Vec<OAuthServerConfig>> {
        Ok(self.servers.read().await.clone())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<OAuthServerConfig>> {
        Ok(self
            .servers
            .read()
            .await
            .iter()
            .find(|s| s.name == name)
            .cloned())
    }
}

//! Mock collaborators for loader tests
//!
//! A route table that records every addition, a store that always fails and
//! a manager factory that counts builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oauthmux_core::repository::{OAuthServerRepository, RepoResult};
use oauthmux_core::{EndpointKind, OAuthServerConfig};
use oauthmux_gateway::oauth::{
    DefaultManagerFactory, Manager, ManagerBuildError, ManagerFactory, StrategyKind,
};
use oauthmux_gateway::{LinkKind, Route, RouteTable};

// ============================================================================
// RecordingRouteTable
// ============================================================================

/// Route table that keeps every added route, duplicates included
#[derive(Default)]
pub struct RecordingRouteTable {
    routes: Mutex<Vec<Route>>,
}

impl RecordingRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.routes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listen paths in the order they were added
    pub fn listen_paths(&self) -> Vec<String> {
        self.routes()
            .iter()
            .map(|r| r.endpoint.listen_path.clone())
            .collect()
    }

    /// Routes added for one server
    pub fn routes_for(&self, server: &str) -> Vec<Route> {
        self.routes()
            .into_iter()
            .filter(|r| r.server == server)
            .collect()
    }

    /// Chain link kinds of the route registered for `server`/`kind`
    pub fn chain_kinds(&self, server: &str, kind: EndpointKind) -> Option<Vec<LinkKind>> {
        self.routes()
            .iter()
            .find(|r| r.server == server && r.kind == kind)
            .map(|r| r.chain.kinds())
    }
}

impl RouteTable for RecordingRouteTable {
    fn add(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

// ============================================================================
// FailingRepository
// ============================================================================

/// Store whose every read fails
pub struct FailingRepository {
    message: String,
}

impl FailingRepository {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl OAuthServerRepository for FailingRepository {
    async fn find_all(&self) -> RepoResult<Vec<OAuthServerConfig>> {
        Err(anyhow::anyhow!(self.message.clone()))
    }

    async fn find_by_name(&self, _name: &str) -> RepoResult<Option<OAuthServerConfig>> {
        Err(anyhow::anyhow!(self.message.clone()))
    }
}

// ============================================================================
// CountingFactory
// ============================================================================

/// Manager factory delegating to the default one and counting builds
#[derive(Default)]
pub struct CountingFactory {
    inner: DefaultManagerFactory,
    builds: AtomicUsize,
}

impl CountingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ManagerFactory for CountingFactory {
    fn build(
        &self,
        kind: StrategyKind,
        settings: &serde_json::Value,
    ) -> Result<Arc<dyn Manager>, ManagerBuildError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.build(kind, settings)
    }
}

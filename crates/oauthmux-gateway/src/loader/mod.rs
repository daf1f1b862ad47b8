//! OAuth loader - sequences the registration pipeline
//!
//! ```text
//! store ──► DefinitionAssembler ──► MiddlewareChainBuilder ──► RouteRegistrar ──► RouteTable
//! ```
//!
//! Only a store failure aborts a load. A server whose manager does not
//! resolve contributes no routes, and an invalid endpoint does not stop its
//! siblings from registering.

mod assembler;

pub use assembler::{Assembled, DefinitionAssembler, SkippedServer};

use std::sync::Arc;

use oauthmux_core::{EndpointDefinition, EndpointKind, OAuthServerRepository};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::middleware::{MiddlewareChain, MiddlewareChainBuilder};
use crate::oauth::{ManagerFactory, ManagerResolver, OAuthSpec};
use crate::routing::{RegisterOutcome, RouteRegistrar, RouteTable};

/// Fatal load failure
#[derive(Debug, Error)]
pub enum LoadError {
    /// The definition store could not be read; nothing was registered
    #[error("failed to retrieve OAuth server definitions: {0:#}")]
    Store(anyhow::Error),
}

/// Per-server registration counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSummary {
    pub name: String,
    pub registered: usize,
    pub absent: usize,
    pub invalid: usize,
}

/// What a load pass did
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Servers that were registered, in store order
    pub servers: Vec<ServerSummary>,
    /// Servers skipped because their manager did not resolve
    pub skipped_servers: Vec<SkippedServer>,
    /// Resolved servers, for callers that need their managers
    pub specs: Vec<Arc<OAuthSpec>>,
}

impl LoadSummary {
    /// Total number of routes added to the table
    pub fn registered_routes(&self) -> usize {
        self.servers.iter().map(|s| s.registered).sum()
    }
}

/// Turns stored OAuth server definitions into guarded routes
pub struct OAuthLoader {
    assembler: DefinitionAssembler,
    chains: MiddlewareChainBuilder,
    registrar: RouteRegistrar,
}

impl OAuthLoader {
    pub fn new(
        table: Arc<dyn RouteTable>,
        factory: Arc<dyn ManagerFactory>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            assembler: DefinitionAssembler::new(ManagerResolver::new(factory)),
            chains: MiddlewareChainBuilder::from_config(config),
            registrar: RouteRegistrar::new(table),
        }
    }

    /// Load every definition from `repo` and register its endpoints.
    ///
    /// Re-running reprocesses everything from scratch; it does not diff
    /// against routes registered earlier.
    pub async fn load(&self, repo: &dyn OAuthServerRepository) -> Result<LoadSummary, LoadError> {
        let assembled = self.assembler.assemble(repo).await?;
        let mut summary = self.register_servers(&assembled.specs);
        summary.skipped_servers = assembled.skipped;
        summary.specs = assembled.specs;
        Ok(summary)
    }

    /// Register the endpoints of already resolved servers
    pub fn register_servers(&self, specs: &[Arc<OAuthSpec>]) -> LoadSummary {
        debug!("[OAuthLoader] Loading OAuth servers configurations");

        let servers: Vec<ServerSummary> = specs.iter().map(|spec| self.register_server(spec)).collect();

        info!(
            servers = servers.len(),
            routes = servers.iter().map(|s| s.registered).sum::<usize>(),
            "[OAuthLoader] Done loading OAuth servers configurations"
        );
        LoadSummary {
            servers,
            ..Default::default()
        }
    }

    fn register_server(&self, spec: &Arc<OAuthSpec>) -> ServerSummary {
        debug!(name = %spec.name(), "[OAuthLoader] Registering OAuth server");

        let mut summary = ServerSummary {
            name: spec.name().to_string(),
            ..Default::default()
        };
        for (kind, endpoint, chain) in self.endpoint_chains(spec) {
            match self.registrar.register(spec.name(), kind, endpoint, &chain) {
                RegisterOutcome::Registered => summary.registered += 1,
                RegisterOutcome::Absent => summary.absent += 1,
                RegisterOutcome::Invalid(_) => summary.invalid += 1,
            }
        }

        debug!(
            name = %spec.name(),
            registered = summary.registered,
            invalid = summary.invalid,
            "[OAuthLoader] OAuth server registered"
        );
        summary
    }

    /// The six endpoint slots of a server paired with their chains, in
    /// registration order
    fn endpoint_chains<'a>(
        &self,
        spec: &'a Arc<OAuthSpec>,
    ) -> Vec<(EndpointKind, Option<&'a EndpointDefinition>, MiddlewareChain)> {
        let middleware = self.chains.for_server(spec);
        EndpointKind::ALL
            .into_iter()
            .map(|kind| (kind, spec.config().endpoint(kind), middleware.chain(kind)))
            .collect()
    }
}

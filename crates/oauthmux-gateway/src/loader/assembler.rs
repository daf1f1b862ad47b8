//! Definition assembler - stored definitions to resolved specs

use std::sync::Arc;

use oauthmux_core::OAuthServerRepository;
use tracing::{debug, error};

use super::LoadError;
use crate::oauth::{ManagerResolver, OAuthSpec};

/// A server left out of the load because its manager did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedServer {
    pub name: String,
    pub reason: String,
}

/// Output of one assembly pass
#[derive(Debug, Default)]
pub struct Assembled {
    /// Resolved servers, in store order
    pub specs: Vec<Arc<OAuthSpec>>,
    pub skipped: Vec<SkippedServer>,
}

/// Pulls definitions from the store and resolves their managers
#[derive(Clone)]
pub struct DefinitionAssembler {
    resolver: ManagerResolver,
}

impl DefinitionAssembler {
    pub fn new(resolver: ManagerResolver) -> Self {
        Self { resolver }
    }

    /// Retrieve every definition and resolve it.
    ///
    /// Only a store failure is an error. Servers whose manager cannot be
    /// resolved are logged and dropped without reordering the rest.
    pub async fn assemble(
        &self,
        repo: &dyn OAuthServerRepository,
    ) -> Result<Assembled, LoadError> {
        let configs = repo.find_all().await.map_err(LoadError::Store)?;
        debug!("[DefinitionAssembler] Retrieved {} OAuth server definitions", configs.len());

        let mut assembled = Assembled::default();
        for config in configs {
            match self.resolver.resolve(&config) {
                Ok(manager) => {
                    debug!(
                        name = %config.name,
                        strategy = %manager.kind(),
                        "[DefinitionAssembler] Token manager resolved"
                    );
                    assembled.specs.push(Arc::new(OAuthSpec::new(config, manager)));
                }
                Err(e) => {
                    error!(
                        name = %config.name,
                        error = %e,
                        "[DefinitionAssembler] OAuth definition is not well configured, skipping..."
                    );
                    assembled.skipped.push(SkippedServer {
                        name: config.name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(assembled)
    }
}

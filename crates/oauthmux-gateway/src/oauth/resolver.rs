//! Manager resolution - strategy name to constructed manager

use std::sync::Arc;

use oauthmux_core::OAuthServerConfig;
use thiserror::Error;

use super::manager::{Manager, ManagerBuildError, ManagerFactory, StrategyKind, UnknownStrategyError};

/// Why a server's manager could not be resolved.
///
/// Either way the server is skipped for this load.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    UnknownStrategy(#[from] UnknownStrategyError),

    #[error(transparent)]
    ManagerBuild(#[from] ManagerBuildError),
}

/// Maps a server's token strategy to a manager instance
#[derive(Clone)]
pub struct ManagerResolver {
    factory: Arc<dyn ManagerFactory>,
}

impl ManagerResolver {
    pub fn new(factory: Arc<dyn ManagerFactory>) -> Self {
        Self { factory }
    }

    /// Parse the strategy name and build its manager from the settings.
    ///
    /// No I/O happens here.
    pub fn resolve(&self, config: &OAuthServerConfig) -> Result<Arc<dyn Manager>, ResolveError> {
        let kind: StrategyKind = config.token_strategy.name.parse()?;
        Ok(self.factory.build(kind, &config.token_strategy.settings)?)
    }
}

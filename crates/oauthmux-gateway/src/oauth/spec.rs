//! Resolved OAuth server

use std::sync::Arc;

use oauthmux_core::OAuthServerConfig;

use super::manager::Manager;

/// An OAuth server definition together with its resolved token manager.
///
/// Only produced after the manager resolved, so every spec has one.
#[derive(Debug, Clone)]
pub struct OAuthSpec {
    config: OAuthServerConfig,
    manager: Arc<dyn Manager>,
}

impl OAuthSpec {
    pub fn new(config: OAuthServerConfig, manager: Arc<dyn Manager>) -> Self {
        Self { config, manager }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &OAuthServerConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<dyn Manager> {
        &self.manager
    }
}

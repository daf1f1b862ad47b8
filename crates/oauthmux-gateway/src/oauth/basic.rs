//! Basic token strategy
//!
//! Tokens are opaque to the gateway and the upstream OAuth server stays the
//! authority; the gateway only rejects requests without a token.

use async_trait::async_trait;

use super::manager::{Manager, StrategyKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicManager;

#[async_trait]
impl Manager for BasicManager {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Basic
    }

    async fn is_key_authorised(&self, access_token: &str) -> bool {
        !access_token.trim().is_empty()
    }
}

//! Introspection token strategy
//!
//! Asks the OAuth server whether an opaque token is active
//! (RFC 7662 form POST, `{"active": true}` response).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::manager::{Manager, ManagerBuildError, StrategyKind};

/// Settings for the `introspection` strategy
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionSettings {
    /// Introspection endpoint of the OAuth server
    pub url: String,

    /// Optional `token_type_hint` sent with every request
    #[serde(default)]
    pub token_type_hint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

#[derive(Deserialize)]
struct IntrospectionResponse {
    #[serde(default)]
    active: bool,
}

/// Manager delegating token checks to the OAuth server
#[derive(Debug, Clone)]
pub struct IntrospectionManager {
    http: reqwest::Client,
    url: Url,
    token_type_hint: Option<String>,
    timeout: Duration,
}

impl IntrospectionManager {
    pub fn new(
        http: reqwest::Client,
        settings: IntrospectionSettings,
    ) -> Result<Self, ManagerBuildError> {
        let url = Url::parse(&settings.url).map_err(|e| ManagerBuildError::Misconfigured {
            kind: StrategyKind::Introspection,
            reason: format!("invalid url '{}': {}", settings.url, e),
        })?;

        Ok(Self {
            http,
            url,
            token_type_hint: settings.token_type_hint,
            timeout: Duration::from_secs(settings.timeout_secs),
        })
    }

    /// Introspection endpoint
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Manager for IntrospectionManager {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Introspection
    }

    async fn is_key_authorised(&self, access_token: &str) -> bool {
        if access_token.is_empty() {
            return false;
        }

        let mut form = vec![("token", access_token)];
        if let Some(hint) = self.token_type_hint.as_deref() {
            form.push(("token_type_hint", hint));
        }

        let response = match self
            .http
            .post(self.url.clone())
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("[IntrospectionManager] Request to {} failed: {}", self.url, e);
                return false;
            }
        };

        if !response.status().is_success() {
            debug!(
                "[IntrospectionManager] {} answered {}",
                self.url,
                response.status()
            );
            return false;
        }

        match response.json::<IntrospectionResponse>().await {
            Ok(body) => body.active,
            Err(e) => {
                warn!("[IntrospectionManager] Invalid response from {}: {}", self.url, e);
                false
            }
        }
    }
}

//! Loader configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable holding the definitions directory
pub const ENV_DEFINITIONS_DIR: &str = "OAUTHMUX_DEFINITIONS_DIR";
/// Environment variable holding the default log filter
pub const ENV_LOG_FILTER: &str = "OAUTHMUX_LOG";
/// Environment variable holding the log file directory
pub const ENV_LOG_DIR: &str = "OAUTHMUX_LOG_DIR";
/// Environment variable naming the header used as rate limit key
pub const ENV_RATE_LIMIT_KEY_HEADER: &str = "OAUTHMUX_RATE_LIMIT_KEY_HEADER";
/// Environment variable enabling `X-Forwarded-For` / `X-Real-IP` client keys
pub const ENV_TRUST_FORWARD_HEADERS: &str = "OAUTHMUX_TRUST_FORWARD_HEADERS";

/// OAuth loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory holding `*.json` OAuth server definitions
    pub definitions_dir: PathBuf,
    /// Default tracing filter (overridden by `RUST_LOG`)
    pub log_filter: String,
    /// Directory for rotated log files (console only when unset)
    pub log_dir: Option<PathBuf>,
    /// Header consulted first when keying rate limit counters
    pub rate_limit_key_header: Option<String>,
    /// Key rate limit counters by forwarding headers (set only behind a
    /// proxy that overwrites them)
    #[serde(default)]
    pub trust_forward_headers: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("oauth"),
            log_filter: "info,oauthmux_gateway=debug".to_string(),
            log_dir: None,
            rate_limit_key_header: None,
            trust_forward_headers: false,
        }
    }
}

impl LoaderConfig {
    /// Build a config from `OAUTHMUX_*` environment variables.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            definitions_dir: lookup(ENV_DEFINITIONS_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.definitions_dir),
            log_filter: lookup(ENV_LOG_FILTER).unwrap_or(defaults.log_filter),
            log_dir: lookup(ENV_LOG_DIR).map(PathBuf::from).or(defaults.log_dir),
            rate_limit_key_header: lookup(ENV_RATE_LIMIT_KEY_HEADER)
                .filter(|h| !h.trim().is_empty())
                .or(defaults.rate_limit_key_header),
            trust_forward_headers: lookup(ENV_TRUST_FORWARD_HEADERS)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.trust_forward_headers),
        }
    }
}

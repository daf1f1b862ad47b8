//! Filesystem implementation of OAuthServerRepository.
//!
//! Reads every `*.json` file in a directory; each file holds a single
//! OAuth server definition. Files are read in path order so that loading is
//! deterministic.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use oauthmux_core::{OAuthServerConfig, OAuthServerRepository};
use tracing::debug;

/// Directory-backed definition store.
pub struct FileSystemOAuthServerRepository {
    dir: PathBuf,
}

impl FileSystemOAuthServerRepository {
    /// Create a repository reading definitions from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this repository reads from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn definition_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(anyhow!(
                "definitions directory not found: {}",
                self.dir.display()
            ));
        }

        let dir = self
            .dir
            .to_str()
            .ok_or_else(|| anyhow!("non UTF-8 path: {}", self.dir.display()))?;
        let pattern = format!("{}/*.json", glob::Pattern::escape(dir.trim_end_matches('/')));

        let mut paths = glob::glob(&pattern)
            .with_context(|| format!("invalid glob pattern {}", pattern))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to list definition files")?;
        paths.sort();
        Ok(paths)
    }

    async fn read_definition(path: &Path) -> Result<OAuthServerConfig> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[async_trait]
impl OAuthServerRepository for FileSystemOAuthServerRepository {
    async fn find_all(&self) -> Result<Vec<OAuthServerConfig>> {
        let paths = self.definition_paths()?;
        debug!(
            "[FileSystemRepository] Reading {} definition(s) from {}",
            paths.len(),
            self.dir.display()
        );

        let mut servers = Vec::with_capacity(paths.len());
        for path in paths {
            servers.push(Self::read_definition(&path).await?);
        }
        Ok(servers)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<OAuthServerConfig>> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .find(|s| s.name == name))
    }
}

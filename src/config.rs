use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// Top-level configuration loaded from `config.json`
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Credential entries keyed by an opaque id
    pub authentication: HashMap<String, AuthEntry>,

    /// Repositories to process, in declaration order
    pub repository: Vec<RepositorySpec>,
}

/// One credential entry, referenced from remote specs by id
#[derive(Debug, Deserialize, Clone)]
pub struct AuthEntry {
    pub username: String,
    pub password: String,
}

/// One unit of sync work: a named working copy with a source and a target remote
#[derive(Debug, Deserialize, Clone)]
pub struct RepositorySpec {
    /// Working-copy directory name under the workspace
    pub name: String,
    pub source: RemoteSpec,
    pub target: RemoteSpec,
}

/// A remote endpoint with its branch and optional credential id
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteSpec {
    pub url: String,
    pub branch: String,

    /// Credential id; empty or absent means unauthenticated
    #[serde(default)]
    pub authentication: String,
}

impl RemoteSpec {
    /// The credential id, with the empty string treated as "none"
    pub fn auth_id(&self) -> Option<&str> {
        if self.authentication.is_empty() {
            None
        } else {
            Some(self.authentication.as_str())
        }
    }
}

impl Config {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "configuration file not found: {} (expected a JSON object with \
                 \"authentication\" and \"repository\" sections)",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Reject configurations that cannot drive a correct run
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for spec in &self.repository {
            if spec.name.is_empty() {
                bail!("repository entry with empty \"name\"");
            }
            if !seen.insert(spec.name.as_str()) {
                bail!(
                    "duplicate repository name {:?}: entries would collide on the same working copy",
                    spec.name
                );
            }
            for (role, remote) in [("source", &spec.source), ("target", &spec.target)] {
                if let Some(id) = remote.auth_id() {
                    if !self.authentication.contains_key(id) {
                        warn!(
                            "repository {:?}: {} references unknown authentication id {:?}, \
                             proceeding without credentials",
                            spec.name, role, id
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

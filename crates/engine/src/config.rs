//! Engine configuration from the environment.
//!
//! | Variable                        | Default   |
//! |---------------------------------|-----------|
//! | `TALEGRAPH_PROJECT_ROOT`        | `.`       |
//! | `TALEGRAPH_MAX_DOCUMENT_BYTES`  | 8 MiB     |
//!
//! A `.env.local` or `.env` next to the workspace is read first, without
//! overriding variables that are already set.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::infrastructure::persistence::{YamlProjectStore, DEFAULT_MAX_DOCUMENT_BYTES};

pub const PROJECT_ROOT_VAR: &str = "TALEGRAPH_PROJECT_ROOT";
pub const MAX_DOCUMENT_BYTES_VAR: &str = "TALEGRAPH_MAX_DOCUMENT_BYTES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive byte count, got '{value}'")]
    InvalidByteCount { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub project_root: PathBuf,
    pub max_document_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so tests need not touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup(PROJECT_ROOT_VAR).filter(|s| !s.trim().is_empty()) {
            config.project_root = PathBuf::from(root.trim());
        }

        if let Some(raw) = lookup(MAX_DOCUMENT_BYTES_VAR) {
            config.max_document_bytes = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidByteCount {
                    var: MAX_DOCUMENT_BYTES_VAR,
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }

    /// Replace the project root, e.g. with a command-line argument.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn store(&self) -> YamlProjectStore {
        YamlProjectStore::new().with_max_document_bytes(self.max_document_bytes)
    }
}

/// Load `.env.local` then `.env` from `dir`, if present.
pub fn load_dotenv(dir: &Path) {
    for filename in [".env.local", ".env"] {
        let path = dir.join(filename);
        if path.exists() {
            if let Err(e) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable env file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn reads_both_variables() {
        let config = EngineConfig::from_lookup(lookup(&[
            (PROJECT_ROOT_VAR, "/srv/story"),
            (MAX_DOCUMENT_BYTES_VAR, "1024"),
        ]))
        .unwrap();

        assert_eq!(config.project_root, PathBuf::from("/srv/story"));
        assert_eq!(config.max_document_bytes, 1024);
        assert_eq!(config.store().max_document_bytes(), 1024);
    }

    #[test]
    fn rejects_bad_byte_counts() {
        for bad in ["zero", "0", "-5"] {
            let err = EngineConfig::from_lookup(lookup(&[(MAX_DOCUMENT_BYTES_VAR, bad)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidByteCount {
                    var: MAX_DOCUMENT_BYTES_VAR,
                    value: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn cli_root_overrides_environment() {
        let config = EngineConfig::from_lookup(lookup(&[(PROJECT_ROOT_VAR, "/env")]))
            .unwrap()
            .with_project_root("/cli");
        assert_eq!(config.project_root, PathBuf::from("/cli"));
    }
}

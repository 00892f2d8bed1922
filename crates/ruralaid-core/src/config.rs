//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3003;

/// Maximum number of catalog rows returned for a single turn.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Paths to all RuralAid data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Program catalog database directory (`data/catalog/`).
    pub catalog: PathBuf,
    /// Optional vocabulary override (`data/vocabulary.json`).
    pub vocabulary_file: PathBuf,
    /// Program seed file loaded into an empty catalog (`data/programs.json`).
    pub seed_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            catalog: root.join("catalog"),
            vocabulary_file: root.join("vocabulary.json"),
            seed_file: root.join("programs.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.catalog)?;
        Ok(())
    }
}

/// Top-level RuralAid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuralAidConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Row cap applied to every catalog search.
    pub result_limit: usize,
}

impl RuralAidConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    ///
    /// Unset variables take their defaults; set but malformed ones are an
    /// [`Error::Config`].
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got {:?}", p)))?,
            None => DEFAULT_PORT,
        };

        let result_limit = match lookup("RURALAID_RESULT_LIMIT") {
            Some(l) => l
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|l| *l > 0)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "RURALAID_RESULT_LIMIT must be a positive integer, got {:?}",
                        l
                    ))
                })?,
            None => DEFAULT_RESULT_LIMIT,
        };

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            port,
            data_paths,
            result_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuralAidConfig::from_lookup(dir.path(), |_| None).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.result_limit, DEFAULT_RESULT_LIMIT);
        assert!(config.data_paths.catalog.is_dir());
        assert_eq!(
            config.data_paths.seed_file,
            dir.path().join("programs.json")
        );
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let vars: HashMap<&str, &str> =
            [("PORT", "8080"), ("RURALAID_RESULT_LIMIT", "3")].into_iter().collect();
        let config =
            RuralAidConfig::from_lookup(dir.path(), |k| vars.get(k).map(|v| v.to_string()))
                .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.result_limit, 3);
    }

    #[test]
    fn test_malformed_values_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        for (key, value) in [
            ("PORT", "not-a-port"),
            ("PORT", "70000"),
            ("RURALAID_RESULT_LIMIT", "0"),
            ("RURALAID_RESULT_LIMIT", "five"),
        ] {
            let err = RuralAidConfig::from_lookup(dir.path(), |k| {
                (k == key).then(|| value.to_string())
            })
            .unwrap_err();
            match err {
                Error::Config(msg) => assert!(msg.contains(key), "{msg}"),
                other => panic!("expected config error for {key}={value}, got {other:?}"),
            }
        }
    }
}

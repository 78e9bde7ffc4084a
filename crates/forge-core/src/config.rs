//! Repository configuration (`engine.toml`).
//!
//! Parsed from `<root>/engine.toml`. Missing fields use sensible defaults;
//! a missing file is equivalent to an all-defaults document, not an error.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// HTTP transport settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Commit-minting settings.
    #[serde(default)]
    pub commit: CommitConfig,
}

impl RepoConfig {
    /// Load `<root>/engine.toml`, or defaults if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, EngineError> {
        let path = root.join("engine.toml");
        match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|e| EngineError::Config {
                path,
                detail: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(EngineError::Config {
                path,
                detail: e.to_string(),
            }),
        }
    }
}

/// HTTP transport settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8765
}

/// Commit-minting settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitConfig {
    /// Whether a same-second collision on a branch gets a monotonic numeric
    /// suffix (`true`, the default) or silently overwrites the prior
    /// commit directory (`false`, the documented legacy behaviour).
    #[serde(default = "default_collision_suffix")]
    pub collision_suffix: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            collision_suffix: default_collision_suffix(),
        }
    }
}

const fn default_collision_suffix() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(config, RepoConfig::default());
        assert_eq!(config.server.port, 8765);
        assert!(config.commit.collision_suffix);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("engine.toml"), "[server]\nport = 9000\n").unwrap();
        let config = RepoConfig::load(dir.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.commit.collision_suffix);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("engine.toml"), "[server]\nbogus = 1\n").unwrap();
        let result = RepoConfig::load(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn collision_suffix_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("engine.toml"),
            "[commit]\ncollision_suffix = false\n",
        )
        .unwrap();
        let config = RepoConfig::load(dir.path()).unwrap();
        assert!(!config.commit.collision_suffix);
    }
}

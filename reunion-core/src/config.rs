//! Client configuration handling.
//!
//! Configuration is read from `client.toml` in the platform configuration
//! directory (`~/.config/reunion/client.toml` on Linux). Every field has a
//! default except the API base URL, which may also come from the
//! `REUNION_API_BASE_URL` environment variable.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::endpoints::Endpoints;
use crate::store::StoreBackend;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "REUNION_API_BASE_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ClientConfig`].
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No API base URL was configured.
    #[error("API base URL is not configured; set `base_url` in the config file or REUNION_API_BASE_URL")]
    MissingBaseUrl,

    /// The configured base URL cannot be used.
    #[error("invalid API base URL {url:?}: {message}")]
    InvalidBaseUrl { url: String, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root of the reunion REST API, e.g. `https://api.reunion.example.com`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Storage backend for the token and staged email.
    #[serde(default)]
    pub store: StoreBackend,

    /// Directory for the file store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Logging level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".reunion"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            store: StoreBackend::default(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            config_path: PathBuf::new(),
        }
    }
}

impl ClientConfig {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().join("client.toml"))
            .unwrap_or_else(|| PathBuf::from("reunion-client.toml"))
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_path(&Self::default_path())?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load from `path`, or defaults if the file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };

        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.base_url = Some(url);
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Endpoints rooted at the configured base URL.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let base = self.base_url.as_deref().ok_or(ConfigError::MissingBaseUrl)?;
        Endpoints::parse(base)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("app", "reunion", "reunion")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("client.toml");

        let config = ClientConfig::load_from_path(&path).unwrap();
        assert_eq!(config.base_url, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.store, StoreBackend::File);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.config_path, path);
    }

    #[test]
    fn test_parse_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("client.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://api.reunion.example.com"
timeout_secs = 5
store = "memory"
data_dir = "/tmp/reunion-data"
"#,
        )
        .unwrap();

        let config = ClientConfig::load_from_path(&path).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://api.reunion.example.com"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/reunion-data"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_error_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("client.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"").unwrap();

        let err = ClientConfig::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("client.toml"));
    }

    #[test]
    fn test_env_overrides_base_url() {
        let mut config = ClientConfig {
            base_url: Some("https://file.example.com".to_string()),
            ..ClientConfig::default()
        };

        config.apply_env_overrides(|_| None);
        assert_eq!(config.base_url.as_deref(), Some("https://file.example.com"));

        config.apply_env_overrides(|name| {
            (name == BASE_URL_ENV).then(|| "https://env.example.com".to_string())
        });
        assert_eq!(config.base_url.as_deref(), Some("https://env.example.com"));

        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.base_url.as_deref(), Some("https://env.example.com"));
    }

    #[test]
    fn test_endpoints_require_base_url() {
        let config = ClientConfig::default();
        assert!(matches!(config.endpoints(), Err(ConfigError::MissingBaseUrl)));

        let config = ClientConfig {
            base_url: Some("not a url".to_string()),
            ..ClientConfig::default()
        };
        assert!(matches!(config.endpoints(), Err(ConfigError::InvalidBaseUrl { .. })));

        let config = ClientConfig {
            base_url: Some("http://localhost:3000".to_string()),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.endpoints().unwrap().signin().as_str(),
            "http://localhost:3000/auth/signin"
        );
    }
}

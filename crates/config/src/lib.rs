#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for depot
//!
//! Configuration comes from hard-coded defaults, optionally overlaid by a
//! TOML file (`~/.config/depot/config.toml`). Callers that source values
//! elsewhere (flags, environment) mutate the loaded `Config` directly.

mod core;

pub use self::core::{DownloadConfig, NetworkConfig, ServiceConfig};

use depot_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("depot").join("config.toml"))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a value has the wrong type.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        tracing::debug!(path = %path.display(), "loading configuration");
        Self::from_toml(&contents)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Check values that serde cannot validate on its own
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the service URL does not parse
    /// or cannot carry path segments.
    pub fn validate(&self) -> Result<(), Error> {
        self.base_url().map(|_| ())
    }

    /// The service base URL
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the configured URL is not a valid base URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let invalid = || ConfigError::InvalidValue {
            field: "service.base_url".to_string(),
            value: self.service.base_url.clone(),
        };
        let url = Url::parse(&self.service.base_url).map_err(|_| invalid())?;
        if url.cannot_be_a_base() {
            return Err(invalid().into());
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:8080");
        assert!(config.service.api_key.is_empty());
        assert_eq!(config.network.timeout(), Duration::from_secs(300));
        assert_eq!(config.network.pool_idle_timeout(), Duration::from_secs(90));
        assert!(config.network.user_agent.starts_with("depot/"));
        assert!(!config.download.quiet);
        assert!(config.download.resume);
        assert!(config.download.verify);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [service]
            base_url = "https://packages.example.com/api/"
            api_key = "secret"

            [download]
            quiet = true
            "#,
        )
        .unwrap();
        assert_eq!(config.service.api_key, "secret");
        assert!(config.download.quiet);
        assert!(config.download.verify);
        assert_eq!(config.network.connect_timeout, 30);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://packages.example.com/api/"
        );
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[network]\ntimeout = \"soon\"").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.service.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));

        config.service.base_url = "mailto:ops@example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[network]\ntimeout = 12\n").await.unwrap();

        let config = Config::load_or_default(Some(&path)).await.unwrap();
        assert_eq!(config.network.timeout(), Duration::from_secs(12));

        let missing = dir.path().join("missing.toml");
        let err = Config::load_from_file(&missing).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }
}

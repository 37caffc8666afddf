//! Server configuration

use std::{path::PathBuf, time::Duration};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

/// Default config file, read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "STOREFRONT_CONFIG";

/// Prefix for environment overrides, e.g. `STOREFRONT_PORT`
pub const ENV_PREFIX: &str = "STOREFRONT";

/// Configuration result type
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Runtime settings for the API server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// HMAC secret used to verify access tokens
    #[serde(default)]
    pub access_token_secret: String,
    /// Route table file; the built-in table is used when unset
    #[serde(default)]
    pub permission_routes_path: Option<PathBuf>,
    #[serde(default = "default_cache_ttl_secs")]
    pub permission_cache_ttl_secs: u64,
    /// Keep at most this many audit entries in memory; 0 disables auditing
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite://storefront.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_audit_capacity() -> usize {
    1000
}

impl ServerConfig {
    /// Load from `storefront.toml` (or `$STOREFRONT_CONFIG`) and `STOREFRONT_*`
    /// environment variables, then validate
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(path)
    }

    /// Load from a specific file (optional) plus environment overrides
    pub fn load_from(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config = Config::builder()
            .add_source(File::from(path.into()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;
        Ok(server_config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.access_token_secret.trim().is_empty() {
            return Err(ConfigError::Validation(
                "access_token_secret must be set".to_string(),
            ));
        }
        if self.permission_cache_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "permission_cache_ttl_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn permission_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.permission_cache_ttl_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            access_token_secret: String::new(),
            permission_routes_path: None,
            permission_cache_ttl_secs: default_cache_ttl_secs(),
            audit_capacity: default_audit_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(
            &path,
            r#"
port = 8080
access_token_secret = "s3cret"
permission_cache_ttl_secs = 60
"#,
        )
        .unwrap();

        let config = ServerConfig::load_from(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.permission_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.database_url, "sqlite://storefront.db?mode=rwc");
        assert!(config.permission_routes_path.is_none());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.toml");
        std::fs::write(&path, "port = 8080\n").unwrap();

        assert!(matches!(
            ServerConfig::load_from(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = ServerConfig {
            access_token_secret: "secret".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");

        config.permission_cache_ttl_secs = 0;
        assert!(config.validate().is_err());
    }
}

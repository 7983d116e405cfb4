//! Catalog API configuration module.
//!
//! Configuration is layered: built-in defaults, then an optional
//! `catalog.toml` in the working directory, then `CATALOG_*` environment
//! variables (e.g. `CATALOG_PORT=9090`).

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat, FileSourceFile};
use serde::{Deserialize, Serialize};

/// Catalog API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Upper bound on pooled database connections
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing
    pub connect_timeout_secs: u64,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl ApiConfig {
    /// Load configuration from `catalog.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(
            File::with_name("catalog").required(false),
            Environment::with_prefix("CATALOG"),
        )
    }

    /// Load configuration from explicit sources.
    pub fn load_from(
        file: File<FileSourceFile, FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let config: ApiConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("database_path", "./catalog.db")?
            .set_default("max_connections", 5)?
            .set_default("connect_timeout_secs", 30)?
            .set_default("log_level", "info")?
            .add_source(file)
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("connect_timeout_secs".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("database_path".to_string()));
        }
        Ok(())
    }

    /// Pool acquire timeout as a `Duration`.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

//! Configuration loading and management
//!
//! ```yaml
//! server:
//!   bind: 0.0.0.0:8080
//!   seed_demo_data: true
//! paging:
//!   default_page_size: 10
//!   max_page_size: 50
//! ```

use crate::core::error::{ConfigError, TransitResult};
use crate::core::paging::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Paginator};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "TRANSIT_CONFIG";

/// File read from the working directory when the variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "transit.yaml";

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,

    /// Load a small demo network at startup
    pub seed_demo_data: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            seed_demo_data: false,
        }
    }
}

/// Listing page size settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size when `pageSize` is absent
    pub default_page_size: usize,

    /// Larger requested sizes are clamped to this
    pub max_page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PagingConfig {
    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.default_page_size, self.max_page_size)
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    pub server: ServerConfig,
    pub paging: PagingConfig,
}

impl TransitConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> TransitResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> TransitResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$TRANSIT_CONFIG`, else `./transit.yaml`, else defaults
    pub fn load() -> TransitResult<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            tracing::info!("Loading configuration from {}", path);
            return Self::from_yaml_file(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            tracing::info!("Loading configuration from {}", DEFAULT_CONFIG_FILE);
            return Self::from_yaml_file(DEFAULT_CONFIG_FILE);
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paging.max_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "paging.max_page_size".to_string(),
                value: "0".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.paging.default_page_size == 0
            || self.paging.default_page_size > self.paging.max_page_size
        {
            return Err(ConfigError::InvalidValue {
                field: "paging.default_page_size".to_string(),
                value: self.paging.default_page_size.to_string(),
                message: format!("must be between 1 and {}", self.paging.max_page_size),
            });
        }

        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

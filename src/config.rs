//! Configuration for flatkv
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{FlatKvError, Result};

/// Main configuration for a flatkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Storage root. The only file inside is:
    ///   {data_dir}/
    ///     └── data.json
    pub data_dir: PathBuf,

    /// Guard every load-mutate-persist cycle with one lock per store handle.
    /// When false, concurrent writers can lose updates (last write wins).
    pub serialize_access: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Largest request body accepted by `POST /key/:key` (bytes)
    pub max_value_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/tmp"),
            serialize_access: true,
            listen_addr: "0.0.0.0:8080".to_string(),
            max_value_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values a server needs before it starts
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(FlatKvError::Config("data directory must not be empty".to_string()));
        }

        self.socket_addr()?;

        if self.max_value_size == 0 {
            return Err(FlatKvError::Config(
                "max value size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse `listen_addr` into a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            FlatKvError::Config(format!("invalid listen address '{}': {}", self.listen_addr, e))
        })
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (storage root)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable per-store serialization of operations
    pub fn serialize_access(mut self, enabled: bool) -> Self {
        self.config.serialize_access = enabled;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum accepted value size (in bytes)
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.config.max_value_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

//! Configuration module for the netscanner engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// What to do with open ports once the sweep is done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Port sweep and service identification only
    Normal,
    /// Additionally run the matching vulnerability plugin on every open port
    Security,
}

impl std::str::FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(ScanMode::Normal),
            "security" => Ok(ScanMode::Security),
            _ => Err(format!("Unknown scan mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Normal => write!(f, "normal"),
            ScanMode::Security => write!(f, "security"),
        }
    }
}

/// Main configuration structure for scanning operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Target host: IPv4/IPv6 literal or hostname
    pub target: String,

    /// List of ports to scan
    pub ports: Vec<u16>,

    /// Number of concurrent workers
    pub threads: usize,

    /// Timeout for each connection attempt in milliseconds
    pub timeout: u64,

    /// Timeout for the banner read after a successful connect, in milliseconds
    pub banner_timeout: u64,

    /// Post-scan behaviour
    pub mode: ScanMode,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: "localhost".to_string(),
            ports: (1..=100).collect(),
            threads: 100,
            timeout: 2000,
            banner_timeout: 500,
            mode: ScanMode::Normal,
        }
    }
}

impl ScanConfig {
    /// Create a new scan configuration
    pub fn new(target: String) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Set the ports to scan
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    /// Set the number of workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the connect timeout (milliseconds)
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the banner read timeout (milliseconds)
    pub fn with_banner_timeout(mut self, banner_timeout: u64) -> Self {
        self.banner_timeout = banner_timeout;
        self
    }

    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Get banner timeout as Duration
    pub fn banner_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.banner_timeout)
    }

    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: ScanConfig = toml::from_str(&content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default_config() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let config_path = home_dir.join(".netscanner.toml");

        if config_path.exists() {
            match Self::from_toml_file(&config_path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => log::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.target.trim().is_empty() {
            return Err(crate::ScanError::InvalidTarget("Target cannot be empty".to_string()));
        }

        if self.ports.is_empty() {
            return Err(crate::ScanError::ConfigError("No ports specified".to_string()));
        }

        if self.ports.contains(&0) {
            return Err(crate::ScanError::PortRangeError("Port 0 is not valid".to_string()));
        }

        if self.threads == 0 {
            return Err(crate::ScanError::ConfigError("Thread count must be greater than 0".to_string()));
        }

        if self.timeout == 0 {
            return Err(crate::ScanError::ConfigError("Timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

//! netscanner - a concurrent TCP connect scanner with service detection
//! and pluggable security checks.

pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod plugins;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use config::{ScanConfig, ScanMode};
pub use error::ScanError;
pub use network::{PortResult, PortState};
pub use plugins::{Plugin, PluginRegistry, PluginResult, Severity};
pub use scanner::engine::ScanEngine;

pub type Result<T> = std::result::Result<T, ScanError>;

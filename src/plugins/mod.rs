//! Vulnerability check plugins
//!
//! A plugin is a named, stateless probe that runs one protocol-specific check
//! against a single `host:port`. The scan engine never calls plugins itself;
//! callers pick one through the [`registry`] by the identified service name.
//!
//! Two outcomes are kept apart:
//! - `Err(ScanError)`: the probe could not run (dial failure, wrong protocol)
//! - `Ok(PluginResult { vulnerable: false, .. })`: it ran and found nothing

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod ftp;
pub mod http;
pub mod registry;

pub use ftp::FtpWeakPassPlugin;
pub use http::HttpSecurityPlugin;
pub use registry::PluginRegistry;

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one plugin run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginResult {
    pub vulnerable: bool,
    pub details: String,
    /// Only set when `vulnerable` is true
    pub severity: Option<Severity>,
}

impl PluginResult {
    pub fn vulnerable(severity: Severity, details: impl Into<String>) -> Self {
        Self {
            vulnerable: true,
            details: details.into(),
            severity: Some(severity),
        }
    }

    pub fn not_vulnerable(details: impl Into<String>) -> Self {
        Self {
            vulnerable: false,
            details: details.into(),
            severity: None,
        }
    }
}

/// Protocol-specific vulnerability check
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique registry key
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Service names this plugin knows how to probe
    fn services(&self) -> &'static [&'static str];

    /// Port to use when the caller has no scan result to go on
    fn default_port(&self) -> u16;

    async fn scan(&self, target: &str, port: u16, timeout: Duration) -> crate::Result<PluginResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_result_constructors() {
        let found = PluginResult::vulnerable(Severity::Medium, "weak credentials");
        assert!(found.vulnerable);
        assert_eq!(found.severity, Some(Severity::Medium));

        let clean = PluginResult::not_vulnerable("nothing found");
        assert!(!clean.vulnerable);
        assert_eq!(clean.severity, None);
    }

    #[test]
    fn test_severity_ordering_and_serde() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(serde_json::to_string(&Severity::Low).unwrap(), "\"low\"");
        assert_eq!(Severity::High.to_string(), "high");
    }
}

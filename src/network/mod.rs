//! Network module: connect probing, address handling and service identification

pub mod protocol;
pub mod socket;

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Port state enumeration
///
/// A connect scan can only tell "accepted" from "anything else", so refused,
/// timed out and unreachable all collapse into `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortState::Open => write!(f, "open"),
            PortState::Closed => write!(f, "closed"),
        }
    }
}

/// Address family of the scanned host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl IpVersion {
    /// Classify a host string. Hostnames count as IPv4.
    pub fn of_host(host: &str) -> Self {
        let bare = host.trim().trim_start_matches('[').trim_end_matches(']');
        match bare.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_none() => IpVersion::V6,
            _ => IpVersion::V4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IpVersion::V4 => "IPv4",
            IpVersion::V6 => "IPv6",
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single (host, port) pair ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub host: String,
    pub port: u16,
}

impl ScanTarget {
    pub fn new(host: impl Into<String>, port: u16) -> crate::Result<Self> {
        if port == 0 {
            return Err(crate::ScanError::PortRangeError("Port 0 is not valid".to_string()));
        }
        Ok(Self { host: host.into(), port })
    }

    /// `host:port`, with IPv6 literals bracketed
    pub fn address(&self) -> String {
        format_address(&self.host, self.port)
    }
}

/// Build a dialable `host:port` string.
///
/// Bare IPv6 literals get brackets; already-bracketed ones are left alone.
pub fn format_address(host: &str, port: u16) -> String {
    let host = host.trim();
    if host.starts_with('[') {
        return format!("{}:{}", host, port);
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{}]:{}", host, port),
        _ => format!("{}:{}", host, port),
    }
}

/// Scan result for a single port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortResult {
    pub port: u16,
    pub state: PortState,
    pub service: String,
    pub banner: String,
    pub ip_version: IpVersion,
    pub version: Option<String>,
    pub response_time: Duration,
}

impl PortResult {
    pub fn new(port: u16, state: PortState, ip_version: IpVersion) -> Self {
        Self {
            port,
            state,
            service: protocol::UNKNOWN_SERVICE.to_string(),
            banner: String::new(),
            ip_version,
            version: None,
            response_time: Duration::from_millis(0),
        }
    }

    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time = response_time;
        self
    }

    pub fn with_service(mut self, service: String) -> Self {
        self.service = service;
        self
    }

    pub fn with_banner(mut self, banner: String) -> Self {
        self.banner = banner;
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

//! Scanner module containing the worker-pool engine and post-scan security checks

pub mod engine;
pub mod security;

use crate::network::{IpVersion, PortResult, PortState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

pub use engine::ScanEngine;
pub use security::{run_security_checks, SecurityFinding};

/// Complete scan result for one host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Target that was scanned
    pub target: String,

    /// List of open ports
    pub open_ports: Vec<u16>,

    /// List of closed ports
    pub closed_ports: Vec<u16>,

    /// Detailed port results
    pub port_results: Vec<PortResult>,

    /// Total scan duration
    pub duration: Duration,

    /// Wall-clock time the port sweep started
    pub start_time: DateTime<Utc>,

    /// Wall-clock time the port sweep finished
    pub end_time: DateTime<Utc>,

    /// Scan statistics
    pub stats: ScanStats,
}

impl ScanResult {
    pub fn new(target: String) -> Self {
        let now = Utc::now();
        Self {
            target,
            open_ports: Vec::new(),
            closed_ports: Vec::new(),
            port_results: Vec::new(),
            duration: Duration::from_secs(0),
            start_time: now,
            end_time: now,
            stats: ScanStats::new(),
        }
    }

    /// Add a port result to the scan
    pub fn add_port_result(&mut self, result: PortResult) {
        match result.state {
            PortState::Open => self.open_ports.push(result.port),
            PortState::Closed => self.closed_ports.push(result.port),
        }
        self.stats.record(&result);
        self.port_results.push(result);
    }

    /// Set the scan duration
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Record when the sweep ran
    pub fn set_window(&mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) {
        self.start_time = start_time;
        self.end_time = end_time;
    }

    /// Get the total number of ports scanned
    pub fn total_ports(&self) -> usize {
        self.port_results.len()
    }

    /// Open results on IPv6
    pub fn ipv6_open_count(&self) -> usize {
        self.open_results()
            .filter(|r| r.ip_version == IpVersion::V6)
            .count()
    }

    pub fn open_results(&self) -> impl Iterator<Item = &PortResult> {
        self.port_results.iter().filter(|r| r.is_open())
    }

    /// Get scan rate in ports per second
    pub fn scan_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.total_ports() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Sort ports for consistent output
    pub fn sort_ports(&mut self) {
        self.open_ports.sort_unstable();
        self.closed_ports.sort_unstable();
        self.port_results.sort_by_key(|r| r.port);
    }
}

/// Scan statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Connect attempts made
    pub probes_sent: u64,

    /// Ports that accepted the connection
    pub open: u64,

    /// Ports that did not
    pub closed: u64,

    /// Open ports that sent a banner
    pub banners: u64,

    /// Minimum connect time over open ports
    pub min_response_time: Option<Duration>,

    /// Maximum connect time over open ports
    pub max_response_time: Option<Duration>,

    total_response_time: Duration,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one port result into the counters
    pub fn record(&mut self, result: &PortResult) {
        self.probes_sent += 1;
        match result.state {
            PortState::Closed => self.closed += 1,
            PortState::Open => {
                self.open += 1;
                if !result.banner.is_empty() {
                    self.banners += 1;
                }

                let rt = result.response_time;
                self.total_response_time += rt;
                self.min_response_time = Some(self.min_response_time.map_or(rt, |m| m.min(rt)));
                self.max_response_time = Some(self.max_response_time.map_or(rt, |m| m.max(rt)));
            }
        }
    }

    /// Average connect time over open ports
    pub fn avg_response_time(&self) -> Option<Duration> {
        if self.open == 0 {
            return None;
        }
        Some(self.total_response_time / self.open as u32)
    }
}

/// Coalesce duplicates into ascending order
pub fn dedup_ports(ports: &[u16]) -> Vec<u16> {
    ports
        .iter()
        .copied()
        .collect::<BTreeSet<u16>>()
        .into_iter()
        .collect()
}

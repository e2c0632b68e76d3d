//! Utility helpers: port specifications, host normalisation, resource limits

use crate::{Result, ScanError};

/// Parse a port specification such as `"22,80,8000-8100"`.
///
/// The result is sorted and free of duplicates. Port 0, reversed ranges and
/// non-numeric parts are errors; blank parts are skipped.
pub fn parse_ports(port_spec: &str) -> Result<Vec<u16>> {
    let mut ports = Vec::new();

    for part in port_spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u16 = start
                .trim()
                .parse()
                .map_err(|e| ScanError::PortRangeError(format!("Invalid start port '{}': {}", start, e)))?;
            let end: u16 = end
                .trim()
                .parse()
                .map_err(|e| ScanError::PortRangeError(format!("Invalid end port '{}': {}", end, e)))?;

            if start == 0 || end == 0 {
                return Err(ScanError::PortRangeError("Port 0 is not valid".to_string()));
            }
            if start > end {
                return Err(ScanError::PortRangeError(format!(
                    "Start port {} cannot be greater than end port {}",
                    start, end
                )));
            }
            ports.extend(start..=end);
        } else {
            let port: u16 = part
                .parse()
                .map_err(|e| ScanError::PortRangeError(format!("Invalid port '{}': {}", part, e)))?;
            if port == 0 {
                return Err(ScanError::PortRangeError("Port 0 is not valid".to_string()));
            }
            ports.push(port);
        }
    }

    if ports.is_empty() {
        return Err(ScanError::PortRangeError(format!("No ports in '{}'", port_spec)));
    }

    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

/// Trim whitespace and strip the brackets around an IPv6 literal.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
        .to_string()
}

/// Soft limit on open file descriptors, if the platform exposes one
#[cfg(unix)]
pub fn open_files_limit() -> Option<u64> {
    rlimit::Resource::NOFILE.get().ok().map(|(soft, _)| soft)
}

#[cfg(not(unix))]
pub fn open_files_limit() -> Option<u64> {
    None
}

/// Whether `workers` concurrent sockets fit under the descriptor limit,
/// leaving headroom for stdio, log files and the runtime.
pub fn workers_fit_limit(workers: usize, limit: Option<u64>) -> bool {
    const RESERVED_DESCRIPTORS: u64 = 32;
    match limit {
        Some(limit) => (workers as u64).saturating_add(RESERVED_DESCRIPTORS) <= limit,
        None => true,
    }
}

//! Service identification from banners and well-known ports

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Service name reported when neither the banner nor the port table match
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Banner tokens checked in priority order; first match wins.
const BANNER_TOKENS: &[(&str, &str)] = &[
    ("ssh", "ssh"),
    ("ftp", "ftp"),
    ("smtp", "smtp"),
    ("http", "http"),
    ("mysql", "mysql"),
    ("redis", "redis"),
    ("pop3", "pop3"),
    ("imap", "imap"),
    ("postgresql", "postgresql"),
    ("mongodb", "mongodb"),
];

static VERSION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"OpenSSH_([\d\.]+[\w\-]*)",
        r"SSH-([\d\.]+)",
        r"vsftpd ([\d\.]+[\w\-]*)",
        r"ProFTPD ([\d\.]+[\w\-]*)",
        r"Apache/([\d\.]+[\w\-]*)",
        r"nginx/([\d\.]+[\w\-]*)",
        r"Microsoft-IIS/([\d\.]+)",
        r"MySQL ([\d\.]+[\w\-]*)",
        r"PostgreSQL ([\d\.]+[\w\-]*)",
        r"Redis server v=([\d\.]+[\w\-]*)",
        r"Postfix ([\d\.]+[\w\-]*)",
        r"Dovecot ([\d\.]+[\w\-]*)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Common service ports mapping
#[derive(Clone)]
pub struct ServiceDatabase {
    tcp_services: HashMap<u16, &'static str>,
}

impl Default for ServiceDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDatabase {
    pub fn new() -> Self {
        let mut tcp_services = HashMap::new();

        tcp_services.insert(21, "ftp");
        tcp_services.insert(22, "ssh");
        tcp_services.insert(23, "telnet");
        tcp_services.insert(25, "smtp");
        tcp_services.insert(53, "dns");
        tcp_services.insert(80, "http");
        tcp_services.insert(110, "pop3");
        tcp_services.insert(143, "imap");
        tcp_services.insert(443, "https");
        tcp_services.insert(465, "smtps");
        tcp_services.insert(587, "smtp");
        tcp_services.insert(993, "imaps");
        tcp_services.insert(995, "pop3s");
        tcp_services.insert(3306, "mysql");
        tcp_services.insert(3389, "rdp");
        tcp_services.insert(5432, "postgresql");
        tcp_services.insert(6379, "redis");
        tcp_services.insert(8080, "http-proxy");
        tcp_services.insert(8443, "https-alt");
        tcp_services.insert(27017, "mongodb");

        Self { tcp_services }
    }

    pub fn get_tcp_service(&self, port: u16) -> Option<&'static str> {
        self.tcp_services.get(&port).copied()
    }

    /// Name the service behind `port`, preferring what the banner says.
    pub fn identify(&self, port: u16, banner: &str) -> String {
        if let Some(service) = Self::identify_from_banner(banner) {
            return service.to_string();
        }

        self.get_tcp_service(port)
            .unwrap_or(UNKNOWN_SERVICE)
            .to_string()
    }

    fn identify_from_banner(banner: &str) -> Option<&'static str> {
        if banner.is_empty() {
            return None;
        }

        let banner_lower = banner.to_lowercase();
        BANNER_TOKENS
            .iter()
            .find(|(token, _)| banner_lower.contains(token))
            .map(|&(_, service)| service)
    }

    /// Pull a version string out of a banner, if it carries one
    pub fn extract_version(banner: &str) -> Option<String> {
        VERSION_PATTERNS
            .iter()
            .find_map(|regex| regex.captures(banner))
            .and_then(|captures| captures.get(1))
            .map(|version| version.as_str().to_string())
    }
}

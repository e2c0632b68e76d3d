//! HTTP security-header audit

use super::{Plugin, PluginResult, Severity};
use crate::network::format_address;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Tracked headers and the value recommended for each
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    ("Strict-Transport-Security", "max-age=31536000; includeSubDomains"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpSecurityPlugin;

impl HttpSecurityPlugin {
    pub fn new() -> Self {
        Self
    }

    /// Judge a response's headers. Split out from `scan` so it can run without a server.
    pub fn audit_headers(headers: &HeaderMap) -> PluginResult {
        let mut missing = Vec::new();
        let mut misconfigured = Vec::new();

        for &(header, expected) in SECURITY_HEADERS {
            // Non-ASCII values still count as present
            let raw = headers
                .get(header)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .unwrap_or_default();
            let value = raw.trim();

            if value.is_empty() {
                missing.push(header);
            } else if header == "X-Frame-Options" && !Self::frame_options_ok(value) {
                misconfigured.push(format!("{}: {} (expected {})", header, value, expected));
            }
        }

        if !missing.is_empty() {
            let mut details = format!("Missing security headers: {}", missing.join(", "));
            if !misconfigured.is_empty() {
                details.push_str(&format!("; misconfigured: {}", misconfigured.join(", ")));
            }
            return PluginResult::vulnerable(Severity::Low, details);
        }

        if !misconfigured.is_empty() {
            return PluginResult::vulnerable(
                Severity::Low,
                format!("Insecure header configuration: {}", misconfigured.join(", ")),
            );
        }

        PluginResult::not_vulnerable("Security headers present and correctly configured")
    }

    fn frame_options_ok(value: &str) -> bool {
        let upper = value.to_uppercase();
        upper == "DENY" || upper.contains("SAMEORIGIN")
    }
}

#[async_trait]
impl Plugin for HttpSecurityPlugin {
    fn name(&self) -> &'static str {
        "http-security"
    }

    fn description(&self) -> &'static str {
        "Audits HTTP responses for missing or weak security headers"
    }

    fn services(&self) -> &'static [&'static str] {
        &["http", "https"]
    }

    fn default_port(&self) -> u16 {
        80
    }

    async fn scan(&self, target: &str, port: u16, timeout: Duration) -> crate::Result<PluginResult> {
        let url = format!("http://{}/", format_address(target, port));

        let client = reqwest::Client::builder().timeout(timeout).no_proxy().build()?;
        let response = client.get(&url).send().await?;
        log::debug!("GET {} -> {}", url, response.status());

        Ok(Self::audit_headers(response.headers()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_all_headers_missing() {
        let result = HttpSecurityPlugin::audit_headers(&HeaderMap::new());
        assert!(result.vulnerable);
        assert_eq!(result.severity, Some(Severity::Low));
        for (header, _) in SECURITY_HEADERS {
            assert!(result.details.contains(header), "{} not reported", header);
        }
    }

    #[test]
    fn test_all_headers_correct() {
        let result = HttpSecurityPlugin::audit_headers(&headers(&[
            ("x-content-type-options", "nosniff"),
            ("x-frame-options", "SAMEORIGIN"),
            ("x-xss-protection", "1; mode=block"),
            ("strict-transport-security", "max-age=31536000"),
        ]));
        assert!(!result.vulnerable);
        assert_eq!(result.severity, None);
    }

    #[test]
    fn test_frame_options_misconfigured() {
        let result = HttpSecurityPlugin::audit_headers(&headers(&[
            ("x-content-type-options", "nosniff"),
            ("x-frame-options", "ALLOW-FROM https://example.com"),
            ("x-xss-protection", "1; mode=block"),
            ("strict-transport-security", "max-age=31536000"),
        ]));
        assert!(result.vulnerable);
        assert_eq!(result.severity, Some(Severity::Low));
        assert!(result.details.contains("X-Frame-Options"));
        assert!(result.details.contains("ALLOW-FROM"));
    }

    #[test]
    fn test_non_ascii_header_counts_as_present() {
        let mut map = headers(&[
            ("x-frame-options", "DENY"),
            ("x-xss-protection", "1; mode=block"),
            ("strict-transport-security", "max-age=31536000"),
        ]);
        map.insert("x-content-type-options", HeaderValue::from_bytes(b"nosniff\xe9").unwrap());

        let result = HttpSecurityPlugin::audit_headers(&map);
        assert!(!result.details.contains("X-Content-Type-Options"));
        assert!(!result.vulnerable);
    }

    #[test]
    fn test_frame_options_case_insensitive() {
        assert!(HttpSecurityPlugin::frame_options_ok("deny"));
        assert!(HttpSecurityPlugin::frame_options_ok("sameorigin"));
        assert!(!HttpSecurityPlugin::frame_options_ok("ALLOWALL"));
    }
}

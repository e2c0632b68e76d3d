//! Output formatting: console table, JSON and the HTML report

use crate::network::PortResult;
use crate::scanner::security::CheckOutcome;
use crate::scanner::{ScanResult, SecurityFinding};
use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};

const BANNER_DISPLAY_WIDTH: usize = 30;

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<String>,
    pub colored: bool,
    pub show_closed: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
            show_closed: false,
        }
    }
}

/// Main output manager
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Render and write to the configured file, or stdout
    pub fn write_results(&self, results: &ScanResult, findings: &[SecurityFinding]) -> crate::Result<()> {
        let output = self.render(results, findings)?;

        match &self.config.file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(output.as_bytes())?;
                log::info!("Wrote {:?} report to {}", self.config.format, filename);
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(output.as_bytes())?;
                stdout.flush()?;
            }
        }

        Ok(())
    }

    pub fn render(&self, results: &ScanResult, findings: &[SecurityFinding]) -> crate::Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(results, findings)),
            OutputFormat::Json => self.format_json(results, findings),
            OutputFormat::Html => Ok(self.format_html(results, findings)),
        }
    }

    fn format_text(&self, results: &ScanResult, findings: &[SecurityFinding]) -> String {
        if !self.config.colored {
            colored::control::set_override(false);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "{:<8}{:<8}{:<16}{:<8}{}\n",
            "PORT", "STATE", "SERVICE", "IP", "BANNER"
        ));

        let shown = results
            .port_results
            .iter()
            .filter(|r| r.is_open() || self.config.show_closed);

        for port_result in shown {
            let state = if port_result.is_open() {
                format!("{:<8}", port_result.state.to_string()).bright_green().to_string()
            } else {
                format!("{:<8}", port_result.state.to_string()).bright_black().to_string()
            };
            output.push_str(&format!(
                "{:<8}{}{:<16}{:<8}{}\n",
                port_result.port,
                state,
                port_result.service,
                port_result.ip_version.as_str(),
                truncate(&single_line(&port_result.banner), BANNER_DISPLAY_WIDTH)
            ));

            for finding in findings.iter().filter(|f| f.port == port_result.port) {
                output.push_str(&format_finding_line(finding));
            }
        }

        output.push_str(&format!("\n{}\n", "Statistics:".bold()));
        output.push_str(&format!("  Total ports:  {}\n", results.total_ports()));
        output.push_str(&format!("  Open ports:   {}\n", results.open_ports.len().to_string().bright_green()));
        output.push_str(&format!("  Closed ports: {}\n", results.closed_ports.len()));
        let ipv6 = results.ipv6_open_count();
        if ipv6 > 0 {
            output.push_str(&format!("  IPv6 ports:   {}\n", ipv6));
        }
        if let Some(avg) = results.stats.avg_response_time() {
            output.push_str(&format!("  Avg connect:  {}ms\n", avg.as_millis()));
        }
        output.push_str(&format!("  Duration:     {:.2}s\n", results.duration.as_secs_f64()));

        output
    }

    fn format_json(&self, results: &ScanResult, findings: &[SecurityFinding]) -> crate::Result<String> {
        let report = JsonReport::new(results, findings);
        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn format_html(&self, results: &ScanResult, findings: &[SecurityFinding]) -> String {
        let (start, end) = (results.start_time, results.end_time);
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "<title>Scan report - {}</title>\n",
            escape_html(&results.target)
        ));
        html.push_str(HTML_STYLE);
        html.push_str("</head>\n<body>\n<div class=\"container\">\n");

        html.push_str("<div class=\"header\">\n<h1>Network scan report</h1>\n<p>");
        html.push_str(&format!(
            "Target: <span class=\"highlight\">{}</span> | Started: {} | Finished: {} | Duration: {:.2}s",
            escape_html(&results.target),
            start.format("%Y-%m-%d %H:%M:%S"),
            end.format("%Y-%m-%d %H:%M:%S"),
            results.duration.as_secs_f64()
        ));
        html.push_str("</p>\n</div>\n");

        html.push_str("<div class=\"summary-cards\">\n");
        html.push_str(&summary_card("Total ports", results.total_ports()));
        html.push_str(&summary_card("Open ports", results.open_ports.len()));
        html.push_str(&summary_card("Closed ports", results.closed_ports.len()));
        let ipv6 = results.ipv6_open_count();
        if ipv6 > 0 {
            html.push_str(&summary_card("IPv6 ports", ipv6));
        }
        html.push_str("</div>\n");

        html.push_str("<div class=\"results\">\n<h2>Open ports</h2>\n");
        let open: Vec<&PortResult> = results.open_results().collect();
        if open.is_empty() {
            html.push_str("<p class=\"empty\">No open ports found.</p>\n");
        } else {
            html.push_str("<table>\n<tr><th>Port</th><th>State</th><th>Service</th><th>IP version</th><th>Banner</th></tr>\n");
            for r in open {
                html.push_str(&format!(
                    "<tr><td><strong>{}</strong></td><td><span class=\"open\">{}</span></td><td>{}</td><td>{}</td><td><code>{}</code></td></tr>\n",
                    r.port,
                    r.state,
                    escape_html(&r.service),
                    r.ip_version,
                    escape_html(&r.banner)
                ));
            }
            html.push_str("</table>\n");
        }
        html.push_str("</div>\n");

        if !findings.is_empty() {
            html.push_str("<div class=\"results\">\n<h2>Security checks</h2>\n<table>\n");
            html.push_str("<tr><th>Port</th><th>Plugin</th><th>Result</th><th>Severity</th><th>Details</th></tr>\n");
            for finding in findings {
                let (status, severity, details) = match &finding.outcome {
                    CheckOutcome::Completed(r) if r.vulnerable => (
                        "vulnerable",
                        r.severity.map(|s| s.to_string()).unwrap_or_default(),
                        r.details.clone(),
                    ),
                    CheckOutcome::Completed(r) => ("ok", String::new(), r.details.clone()),
                    CheckOutcome::Failed { error } => ("failed", String::new(), error.clone()),
                };
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td></tr>\n",
                    finding.port,
                    escape_html(&finding.plugin),
                    status,
                    status,
                    severity,
                    escape_html(&details)
                ));
            }
            html.push_str("</table>\n</div>\n");
        }

        html.push_str(&format!(
            "<div class=\"footer\"><p>Generated by <strong>netscanner</strong> | {}</p></div>\n",
            end.format("%Y-%m-%d")
        ));
        html.push_str("</div>\n</body>\n</html>\n");
        html
    }
}

fn format_finding_line(finding: &SecurityFinding) -> String {
    match &finding.outcome {
        CheckOutcome::Completed(r) if r.vulnerable => format!(
            "    {} [{}] {}: {}\n",
            "!".bright_red().bold(),
            r.severity.map(|s| s.to_string()).unwrap_or_default().bright_yellow(),
            finding.plugin,
            truncate(&r.details, 60)
        ),
        CheckOutcome::Completed(r) => format!("    {} {}: {}\n", "✓".bright_green(), finding.plugin, r.details),
        CheckOutcome::Failed { error } => {
            format!("    {} {} failed: {}\n", "?".bright_yellow(), finding.plugin, error)
        }
    }
}

fn summary_card(label: &str, value: usize) -> String {
    format!(
        "<div class=\"card\"><h3>{}</h3><div class=\"number\">{}</div></div>\n",
        label, value
    )
}

/// Fold a banner onto one line for the console table
fn single_line(banner: &str) -> String {
    banner.replace(['\r', '\n'], " ")
}

/// Shorten to `max` characters, ending with "..." when cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const HTML_STYLE: &str = "<style>
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.6; color: #333; background: #eef1f7; padding: 20px; }
.container { max-width: 1200px; margin: 0 auto; }
.header, .results { background: white; border-radius: 10px; padding: 30px; margin-bottom: 20px; }
.header h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; margin-bottom: 10px; }
.highlight { color: #3498db; font-weight: bold; }
.summary-cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 20px; }
.card { background: white; border-radius: 10px; padding: 20px; text-align: center; }
.card .number { font-size: 2em; font-weight: bold; color: #2c3e50; }
table { width: 100%; border-collapse: collapse; margin-top: 15px; }
th, td { padding: 10px; text-align: left; border-bottom: 1px solid #eee; }
th { background: #3498db; color: white; }
.open, .ok { color: #27ae60; font-weight: bold; }
.vulnerable { color: #e74c3c; font-weight: bold; }
.failed { color: #f39c12; }
.empty { color: #7f8c8d; }
.footer { text-align: center; color: #7f8c8d; padding: 10px; }
</style>
";

/// JSON-serializable scan report
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    scan_time: DateTime<Utc>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_seconds: f64,
    scan_rate: f64,
    open_ports: Vec<&'a PortResult>,
    closed_ports: &'a [u16],
    statistics: JsonScanStats,
    findings: &'a [SecurityFinding],
}

#[derive(Debug, Serialize)]
struct JsonScanStats {
    probes_sent: u64,
    open: u64,
    closed: u64,
    banners: u64,
    avg_response_time_ms: Option<u64>,
}

impl<'a> JsonReport<'a> {
    fn new(results: &'a ScanResult, findings: &'a [SecurityFinding]) -> Self {
        Self {
            target: &results.target,
            scan_time: Utc::now(),
            start_time: results.start_time,
            end_time: results.end_time,
            duration_seconds: results.duration.as_secs_f64(),
            scan_rate: results.scan_rate(),
            open_ports: results.open_results().collect(),
            closed_ports: &results.closed_ports,
            statistics: JsonScanStats {
                probes_sent: results.stats.probes_sent,
                open: results.stats.open,
                closed: results.stats.closed,
                banners: results.stats.banners,
                avg_response_time_ms: results.stats.avg_response_time().map(|d| d.as_millis() as u64),
            },
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{IpVersion, PortState};
    use crate::plugins::{PluginResult, Severity};
    use std::time::Duration;

    fn sample() -> ScanResult {
        let mut result = ScanResult::new("127.0.0.1".to_string());
        result.add_port_result(
            PortResult::new(21, PortState::Open, IpVersion::V4)
                .with_service("ftp".to_string())
                .with_banner("220 <ProFTPD> ready".to_string())
                .with_response_time(Duration::from_millis(3)),
        );
        result.add_port_result(PortResult::new(23, PortState::Closed, IpVersion::V4));
        result.set_duration(Duration::from_millis(1500));
        result
    }

    fn finding() -> SecurityFinding {
        SecurityFinding {
            port: 21,
            service: "ftp".to_string(),
            plugin: "ftp-weakpass".to_string(),
            outcome: CheckOutcome::Completed(PluginResult::vulnerable(
                Severity::Medium,
                "Weak credentials accepted: anonymous/",
            )),
        }
    }

    fn manager(format: OutputFormat) -> OutputManager {
        OutputManager::new(OutputConfig {
            format,
            colored: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 30), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_json_output() {
        let json = manager(OutputFormat::Json).render(&sample(), &[finding()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["target"], "127.0.0.1");
        assert_eq!(value["open_ports"][0]["port"], 21);
        assert_eq!(value["open_ports"][0]["ip_version"], "IPv4");
        assert_eq!(value["closed_ports"][0], 23);
        assert_eq!(value["findings"][0]["outcome"]["status"], "completed");
        assert_eq!(value["findings"][0]["outcome"]["severity"], "medium");
    }

    #[test]
    fn test_html_report_escapes_banner() {
        let html = manager(OutputFormat::Html).render(&sample(), &[finding()]).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("220 &lt;ProFTPD&gt; ready"));
        assert!(html.contains("ftp-weakpass"));
        assert!(html.contains("Open ports"));
        assert!(!html.contains("IPv6 ports"));
    }

    #[test]
    fn test_text_output_hides_closed_by_default() {
        let text = manager(OutputFormat::Text).render(&sample(), &[]).unwrap();
        assert!(text.contains("21"));
        assert!(text.contains("ftp"));
        assert!(!text.lines().any(|l| l.starts_with("23 ")));
        assert!(text.contains("Total ports:  2"));
    }

    #[test]
    fn test_html_report_shows_recorded_window() {
        use chrono::TimeZone;

        let mut result = sample();
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 55).unwrap();
        result.set_window(start, end);

        std::thread::sleep(Duration::from_millis(1100));
        let html = manager(OutputFormat::Html).render(&result, &[]).unwrap();

        assert!(html.contains("Started: 2026-03-14 09:26:53"));
        assert!(html.contains("Finished: 2026-03-14 09:26:55"));

        let json = manager(OutputFormat::Json).render(&result, &[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["start_time"], "2026-03-14T09:26:53Z");
    }

    #[test]
    fn test_text_output_keeps_multiline_banner_on_one_row() {
        let mut result = ScanResult::new("127.0.0.1".to_string());
        result.add_port_result(
            PortResult::new(21, PortState::Open, IpVersion::V4)
                .with_service("ftp".to_string())
                .with_banner("220-Welcome\r\n220 ready".to_string()),
        );

        let text = manager(OutputFormat::Text).render(&result, &[]).unwrap();
        let row = text.lines().find(|l| l.starts_with("21 ")).unwrap();
        assert!(row.contains("220-Welcome  220 ready"));
        assert!(!text.lines().any(|l| l.starts_with("220 ready")));
    }
}

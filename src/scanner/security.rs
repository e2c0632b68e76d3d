//! Security mode: dispatch open ports to the plugin matching their service

use crate::network::PortResult;
use crate::plugins::{PluginRegistry, PluginResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What came back from one plugin run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckOutcome {
    Completed(PluginResult),
    /// The plugin could not run; distinct from "ran and found nothing"
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub port: u16,
    pub service: String,
    pub plugin: String,
    pub outcome: CheckOutcome,
}

impl SecurityFinding {
    pub fn is_vulnerable(&self) -> bool {
        matches!(&self.outcome, CheckOutcome::Completed(result) if result.vulnerable)
    }
}

/// Run the mapped plugin against every open result. Ports whose service has
/// no plugin are skipped. Checks still running when `cancel` fires are
/// abandoned and reported as failed.
pub async fn run_security_checks(
    registry: &PluginRegistry,
    host: &str,
    results: &[PortResult],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Vec<SecurityFinding> {
    let checks = results
        .iter()
        .filter(|r| r.is_open())
        .filter_map(|r| registry.plugin_for_service(&r.service).map(|plugin| (r, plugin)))
        .map(|(result, plugin)| async move {
            log::info!("Running {} against {}:{}", plugin.name(), host, result.port);

            let run = tokio::select! {
                run = plugin.scan(host, result.port, timeout) => run,
                _ = cancel.cancelled() => {
                    log::debug!("{} on port {} cancelled", plugin.name(), result.port);
                    Err(crate::ScanError::NetworkError("cancelled".to_string()))
                }
            };

            let outcome = match run {
                Ok(plugin_result) => CheckOutcome::Completed(plugin_result),
                Err(e) => {
                    log::warn!("{} on port {} failed: {}", plugin.name(), result.port, e);
                    CheckOutcome::Failed { error: e.to_string() }
                }
            };

            SecurityFinding {
                port: result.port,
                service: result.service.clone(),
                plugin: plugin.name().to_string(),
                outcome,
            }
        });

    futures::future::join_all(checks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{IpVersion, PortState};

    #[tokio::test]
    async fn test_skips_closed_and_unmapped_ports() {
        let results = vec![
            PortResult::new(22, PortState::Open, IpVersion::V4).with_service("ssh".to_string()),
            PortResult::new(21, PortState::Closed, IpVersion::V4),
        ];

        let findings = run_security_checks(
            &PluginRegistry::with_builtin(),
            "127.0.0.1",
            &results,
            Duration::from_millis(200),
            &CancellationToken::new(),
        )
        .await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_plugin_failure_is_reported_not_raised() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let results = vec![
            PortResult::new(port, PortState::Open, IpVersion::V4).with_service("ftp".to_string()),
        ];

        let findings = run_security_checks(
            &PluginRegistry::with_builtin(),
            "127.0.0.1",
            &results,
            Duration::from_millis(300),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].plugin, "ftp-weakpass");
        assert!(matches!(findings[0].outcome, CheckOutcome::Failed { .. }));
        assert!(!findings[0].is_vulnerable());
    }

    #[tokio::test]
    async fn test_cancel_abandons_stalled_check() {
        // Accepts the control connection but never sends a greeting
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(120)).await;
        });

        let results = vec![
            PortResult::new(port, PortState::Open, IpVersion::V4).with_service("ftp".to_string()),
        ];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let registry = PluginRegistry::with_builtin();
        let findings = tokio::time::timeout(
            Duration::from_secs(5),
            run_security_checks(&registry, "127.0.0.1", &results, Duration::from_secs(60), &cancel),
        )
        .await
        .unwrap();

        assert_eq!(findings.len(), 1);
        match &findings[0].outcome {
            CheckOutcome::Failed { error } => assert!(error.contains("cancelled")),
            other => panic!("expected a failed check, got {:?}", other),
        }
    }
}

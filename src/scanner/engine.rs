//! Worker-pool scanning engine

use crate::config::ScanConfig;
use crate::network::socket::TcpConnectScanner;
use crate::network::{PortResult, ScanTarget};
use crate::scanner::{dedup_ports, ScanResult};
use std::sync::Arc;
use chrono::Utc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Main scanning engine
///
/// A fixed pool of `threads` workers drains a closed port queue; every worker
/// appends to one shared result vector.
pub struct ScanEngine {
    config: ScanConfig,
    tcp_scanner: TcpConnectScanner,
}

impl ScanEngine {
    /// Create a new scan engine with the given configuration
    pub fn new(config: ScanConfig) -> crate::Result<Self> {
        config.validate()?;

        let tcp_scanner =
            TcpConnectScanner::new(config.timeout_duration(), config.banner_timeout_duration());

        Ok(Self { config, tcp_scanner })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the configured target and ports
    pub async fn scan(&self) -> crate::Result<ScanResult> {
        self.scan_with_cancel(CancellationToken::new()).await
    }

    /// Scan the configured target, stopping early once `cancel` fires
    pub async fn scan_with_cancel(&self, cancel: CancellationToken) -> crate::Result<ScanResult> {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let port_results = self
            .scan_ports_with_cancel(&self.config.target, &self.config.ports, cancel)
            .await?;
        let elapsed = start_time.elapsed();
        let finished_at = Utc::now();

        let mut result = ScanResult::new(self.config.target.clone());
        for port_result in port_results {
            result.add_port_result(port_result);
        }
        result.set_duration(elapsed);
        result.set_window(started_at, finished_at);
        result.sort_ports();

        log::info!(
            "Scan of {} finished in {:?}: {} open, {} closed",
            result.target,
            result.duration,
            result.open_ports.len(),
            result.closed_ports.len()
        );

        Ok(result)
    }

    /// Probe every distinct port in `ports` on `host`.
    ///
    /// Returns exactly one result per distinct port, in completion order.
    /// Port 0 anywhere in `ports` is a `PortRangeError` and nothing is dialed.
    pub async fn scan_ports(&self, host: &str, ports: &[u16]) -> crate::Result<Vec<PortResult>> {
        self.scan_ports_with_cancel(host, ports, CancellationToken::new())
            .await
    }

    /// Like [`scan_ports`](Self::scan_ports), but workers stop pulling new ports
    /// once `cancel` fires. Ports already in flight still complete.
    pub async fn scan_ports_with_cancel(
        &self,
        host: &str,
        ports: &[u16],
        cancel: CancellationToken,
    ) -> crate::Result<Vec<PortResult>> {
        let targets = dedup_ports(ports)
            .into_iter()
            .map(|port| ScanTarget::new(host, port))
            .collect::<crate::Result<Vec<_>>>()?;
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.config.threads.min(targets.len());
        log::info!(
            "Scanning {} ports on {} with {} workers",
            targets.len(),
            host,
            workers
        );

        // Filled once, then closed by dropping the sender
        let (job_tx, job_rx) = mpsc::channel::<ScanTarget>(targets.len());
        let total = targets.len();
        for target in targets {
            if job_tx.send(target).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let results = Arc::new(Mutex::new(Vec::with_capacity(total)));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let results = Arc::clone(&results);
            let scanner = self.tcp_scanner.clone();
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        log::debug!("Worker {} cancelled", worker_id);
                        break;
                    }

                    let next = job_rx.lock().await.recv().await;
                    let Some(target) = next else { break };

                    log::trace!("Worker {} probing {}", worker_id, target.address());
                    let result = scanner.probe(&target.host, target.port).await;
                    results.lock().await.push(result);
                }
            }));
        }

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                log::error!("Scan worker failed: {}", e);
            }
        }

        let mut guard = results.lock().await;
        Ok(std::mem::take(&mut *guard))
    }
}

//! TCP connect probing with best-effort banner capture

use crate::network::protocol::ServiceDatabase;
use crate::network::{format_address, IpVersion, PortResult, PortState};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

const BANNER_BUFFER_SIZE: usize = 1024;

/// TCP connect scanner, one full handshake per port
#[derive(Clone)]
pub struct TcpConnectScanner {
    timeout: Duration,
    banner_timeout: Duration,
    service_db: ServiceDatabase,
}

impl TcpConnectScanner {
    pub fn new(timeout: Duration, banner_timeout: Duration) -> Self {
        Self {
            timeout,
            banner_timeout,
            service_db: ServiceDatabase::new(),
        }
    }

    /// Probe one port. Connect failures of any kind produce a `Closed` result.
    pub async fn probe(&self, host: &str, port: u16) -> PortResult {
        let start_time = Instant::now();
        let ip_version = IpVersion::of_host(host);
        let address = format_address(host, port);

        let stream = match timeout(self.timeout, TcpStream::connect(address.as_str())).await {
            Ok(Ok(stream)) => Some(stream),
            Ok(Err(e)) => {
                log::trace!("{} closed: {}", address, e);
                None
            }
            Err(_) => {
                log::trace!("{} timed out after {:?}", address, self.timeout);
                None
            }
        };

        let Some(mut stream) = stream else {
            return PortResult::new(port, PortState::Closed, ip_version)
                .with_response_time(start_time.elapsed());
        };

        let response_time = start_time.elapsed();
        let banner = self.grab_banner(&mut stream).await;
        drop(stream);

        let service = self.service_db.identify(port, &banner);
        let version = ServiceDatabase::extract_version(&banner);
        log::debug!("{} open ({}) [{}ms]", address, service, response_time.as_millis());

        PortResult::new(port, PortState::Open, ip_version)
            .with_response_time(response_time)
            .with_service(service)
            .with_version(version)
            .with_banner(banner)
    }

    /// Single read bounded by the banner timeout; silence or errors mean no banner.
    async fn grab_banner(&self, stream: &mut TcpStream) -> String {
        let mut buffer = [0u8; BANNER_BUFFER_SIZE];

        match timeout(self.banner_timeout, stream.read(&mut buffer)).await {
            Ok(Ok(n)) if n > 0 => String::from_utf8_lossy(&buffer[..n]).trim().to_string(),
            _ => String::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn banner_timeout(&self) -> Duration {
        self.banner_timeout
    }
}

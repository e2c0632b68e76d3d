//! Integration tests for the scan engine against local listeners

use netscanner::{
    config::ScanConfig,
    network::{protocol::ServiceDatabase, PortState},
    scanner::engine::ScanEngine,
};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn config_for(ports: Vec<u16>, threads: usize) -> ScanConfig {
    ScanConfig::new("127.0.0.1".to_string())
        .with_ports(ports)
        .with_threads(threads)
        .with_timeout(1000)
        .with_banner_timeout(300)
}

/// A port nothing listens on
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_silent_listener_is_open_without_banner() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let engine = ScanEngine::new(config_for(vec![port], 4)).unwrap();
    let results = engine.scan_ports("127.0.0.1", &[port]).await.unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.state, PortState::Open);
    assert_eq!(result.banner, "");
    let expected = ServiceDatabase::new().get_tcp_service(port).unwrap_or("unknown");
    assert_eq!(result.service, expected);
    drop(listener);
}

#[tokio::test]
async fn test_no_listener_is_closed_and_unknown() {
    let port = free_port();

    let engine = ScanEngine::new(config_for(vec![port], 1)).unwrap();
    let results = engine.scan_ports("127.0.0.1", &[port]).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].state, PortState::Closed);
    assert_eq!(results[0].service, "unknown");
    assert_eq!(results[0].banner, "");
}

#[tokio::test]
async fn test_banner_identifies_service() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(b"220 ProFTPD 1.3.5 Server ready\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let engine = ScanEngine::new(config_for(vec![port], 1)).unwrap();
    let results = engine.scan_ports("127.0.0.1", &[port]).await.unwrap();

    assert_eq!(results[0].state, PortState::Open);
    assert_eq!(results[0].service, "ftp");
    assert!(results[0].banner.starts_with("220"));
    assert_eq!(results[0].version.as_deref(), Some("1.3.5"));
}

#[tokio::test]
async fn test_one_result_per_port_regardless_of_workers() {
    let ports: Vec<u16> = (0..12).map(|_| free_port()).collect();
    let mut distinct = ports.clone();
    distinct.sort_unstable();
    distinct.dedup();

    for workers in [1, 3, 50] {
        let engine = ScanEngine::new(config_for(ports.clone(), workers)).unwrap();
        let results = engine.scan_ports("127.0.0.1", &ports).await.unwrap();

        let mut seen: Vec<u16> = results.iter().map(|r| r.port).collect();
        seen.sort_unstable();
        assert_eq!(seen, distinct, "workers = {}", workers);
    }
}

#[tokio::test]
async fn test_full_scan_aggregates_open_and_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open = listener.local_addr().unwrap().port();
    let closed = free_port();

    let engine = ScanEngine::new(config_for(vec![closed, open], 8)).unwrap();
    let result = engine.scan().await.unwrap();

    assert_eq!(result.target, "127.0.0.1");
    assert_eq!(result.open_ports, vec![open]);
    assert_eq!(result.closed_ports, vec![closed]);
    assert_eq!(result.total_ports(), 2);
    assert_eq!(result.stats.probes_sent, 2);
    assert_eq!(result.ipv6_open_count(), 0);
    drop(listener);
}

#[tokio::test]
async fn test_cancelled_scan_stops_early() {
    let ports: Vec<u16> = (1..=200).collect();
    let engine = ScanEngine::new(config_for(ports.clone(), 2)).unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let results = engine
        .scan_ports_with_cancel("127.0.0.1", &ports, cancel)
        .await
        .unwrap();

    assert!(results.len() < ports.len());
}

#[tokio::test]
async fn test_port_zero_is_an_error() {
    let engine = ScanEngine::new(config_for(vec![80], 2)).unwrap();
    let result = engine.scan_ports("127.0.0.1", &[0]).await;
    assert!(matches!(result, Err(netscanner::ScanError::PortRangeError(_))));
}

#[test]
fn test_zero_workers_rejected() {
    let result = ScanEngine::new(config_for(vec![80], 0));
    assert!(result.is_err());
}

#[test]
fn test_empty_target_rejected() {
    let config = ScanConfig::new(String::new()).with_ports(vec![80]);
    assert!(ScanEngine::new(config).is_err());
}

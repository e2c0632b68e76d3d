//! Performance benchmarks for netscanner

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use netscanner::{
    config::ScanConfig,
    network::protocol::ServiceDatabase,
    scanner::engine::ScanEngine,
    utils::parse_ports,
};
use tokio::runtime::Runtime;

fn bench_service_identification(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_identification");
    let db = ServiceDatabase::new();

    group.bench_function("port_table", |b| {
        b.iter(|| db.identify(black_box(443), black_box("")))
    });

    group.bench_function("banner_match", |b| {
        b.iter(|| db.identify(black_box(2222), black_box("SSH-2.0-OpenSSH_8.9p1 Ubuntu-3")))
    });

    group.bench_function("version_extract", |b| {
        b.iter(|| ServiceDatabase::extract_version(black_box("Server: Apache/2.4.57 (Debian)")))
    });

    group.finish();
}

fn bench_port_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("port_parsing");

    for spec in ["1-1024", "22,80,443,8000-8100", "1-65535"] {
        group.bench_with_input(BenchmarkId::from_parameter(spec), spec, |b, spec| {
            b.iter(|| parse_ports(black_box(spec)))
        });
    }

    group.finish();
}

fn bench_closed_sweep(c: &mut Criterion) {
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(_) => return,
    };
    let mut group = c.benchmark_group("localhost_sweep");
    group.sample_size(10);

    for workers in [10usize, 100] {
        let config = ScanConfig::new("127.0.0.1".to_string())
            .with_ports((40000..40200).collect())
            .with_threads(workers)
            .with_timeout(200)
            .with_banner_timeout(50);
        let engine = match ScanEngine::new(config) {
            Ok(engine) => engine,
            Err(_) => continue,
        };

        group.bench_with_input(BenchmarkId::new("workers", workers), &engine, |b, engine| {
            b.iter(|| rt.block_on(engine.scan()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_service_identification, bench_port_parsing, bench_closed_sweep);
criterion_main!(benches);

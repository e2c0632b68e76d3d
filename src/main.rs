use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::process;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use netscanner::{
    config::{ScanConfig, ScanMode},
    network::format_address,
    output::{OutputConfig, OutputFormat, OutputManager},
    plugins::{registry, Plugin},
    scanner::{run_security_checks, SecurityFinding},
    utils::{normalize_host, open_files_limit, parse_ports, workers_fit_limit},
    ScanEngine,
};

fn build_cli() -> Command {
    Command::new("netscanner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Concurrent TCP port scanner with service detection and security checks")
        .arg(
            Arg::new("host")
                .short('H')
                .long("host")
                .value_name("HOST")
                .help("Target host, IPv4/IPv6 literal or hostname [default: localhost]"),
        )
        .arg(
            Arg::new("ports")
                .short('p')
                .long("ports")
                .value_name("PORTS")
                .help("Ports to scan, e.g. 22,80,8000-8100 [default: 1-100]"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Connect timeout in seconds [default: 2]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .value_name("N")
                .help("Number of concurrent workers [default: 100]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("plugin")
                .short('P')
                .long("plugin")
                .value_name("NAME")
                .help("Run a single plugin against the host instead of a port scan"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("Scan mode: normal or security")
                .value_parser(["normal", "security"]),
        )
        .arg(
            Arg::new("report")
                .short('r')
                .long("report")
                .value_name("FILE")
                .help("Write an HTML report to FILE"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FORMAT")
                .help("Console output format")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("plugins").about("List available plugins"))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

/// Command line values win over `~/.netscanner.toml`, which wins over defaults
fn build_config(matches: &ArgMatches) -> anyhow::Result<ScanConfig> {
    let mut config = ScanConfig::load_default_config();

    if let Some(host) = matches.get_one::<String>("host") {
        config.target = host.clone();
    }
    config.target = normalize_host(&config.target);

    if let Some(spec) = matches.get_one::<String>("ports") {
        config.ports = parse_ports(spec)?;
    }
    if let Some(&secs) = matches.get_one::<u64>("timeout") {
        config.timeout = secs.saturating_mul(1000);
    }
    if let Some(&workers) = matches.get_one::<usize>("workers") {
        config.threads = workers;
    }
    if let Some(mode) = matches.get_one::<String>("mode") {
        config.mode = mode.parse::<ScanMode>().map_err(|e: String| anyhow!(e))?;
    }

    config.validate()?;
    Ok(config)
}

fn list_plugins() {
    let registry = registry::global();
    println!("{}", "Available plugins:".bold());
    for name in registry.list() {
        if let Some(plugin) = registry.get(&name) {
            println!(
                "  {:<16} {} (services: {}, default port {})",
                name.bright_cyan(),
                plugin.description(),
                plugin.services().join(", "),
                plugin.default_port()
            );
        }
    }
}

async fn run_plugin(name: &str, config: &ScanConfig, explicit_ports: bool) -> anyhow::Result<()> {
    let registry = registry::global();
    let plugin = registry
        .get(name)
        .ok_or_else(|| anyhow!("unknown plugin '{}' (available: {})", name, registry.list().join(", ")))?;

    let ports = if explicit_ports {
        config.ports.clone()
    } else {
        vec![plugin.default_port()]
    };

    for port in ports {
        let address = format_address(&config.target, port);
        match plugin.scan(&config.target, port, config.timeout_duration()).await {
            Ok(result) if result.vulnerable => {
                let severity = result.severity.map(|s| s.to_string()).unwrap_or_default();
                println!(
                    "{} {} {} [{}]: {}",
                    "[!]".bright_red().bold(),
                    address,
                    plugin.name().bright_cyan(),
                    severity.bright_yellow(),
                    result.details
                );
            }
            Ok(result) => {
                println!(
                    "{} {} {}: {}",
                    "[✓]".bright_green(),
                    address,
                    plugin.name().bright_cyan(),
                    result.details
                );
            }
            Err(e) => {
                eprintln!("{} {} {} failed: {}", "[?]".bright_yellow(), address, plugin.name(), e);
            }
        }
    }

    Ok(())
}

const INTERRUPT_EXIT_CODE: i32 = 130;

/// First Ctrl-C cancels the scan; any later one gives the exit code to quit with
fn handle_interrupt(cancel: &CancellationToken) -> Option<i32> {
    if cancel.is_cancelled() {
        return Some(INTERRUPT_EXIT_CODE);
    }
    cancel.cancel();
    None
}

fn watch_interrupts(cancel: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match handle_interrupt(&cancel) {
                Some(code) => {
                    eprintln!("{}", "[!] Interrupted again, exiting".bright_red());
                    process::exit(code);
                }
                None => log::warn!("Interrupted, finishing in-flight probes (Ctrl-C again to quit)"),
            }
        }
    });
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn run_scan(matches: &ArgMatches, config: ScanConfig) -> anyhow::Result<()> {
    let format: OutputFormat = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("text")
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let colored_output = !matches.get_flag("no-color");
    if !colored_output {
        colored::control::set_override(false);
    }

    let workers = config.threads.min(config.ports.len());
    if !workers_fit_limit(workers, open_files_limit()) {
        eprintln!(
            "{} {}",
            "[!] WARNING: worker count may exceed the open file limit:".bright_yellow(),
            open_files_limit().unwrap_or_default()
        );
    }

    let cancel = CancellationToken::new();
    watch_interrupts(cancel.clone());

    let engine = ScanEngine::new(config.clone())?;
    let pb = spinner(format!(
        "Scanning {} ({} ports, {} workers)",
        config.target,
        config.ports.len(),
        workers
    ));
    let result = engine.scan_with_cancel(cancel.clone()).await?;
    pb.finish_and_clear();

    let findings: Vec<SecurityFinding> = if config.mode == ScanMode::Security {
        let pb = spinner("Running security checks".to_string());
        let findings = run_security_checks(
            registry::global(),
            &config.target,
            &result.port_results,
            config.timeout_duration(),
            &cancel,
        )
        .await;
        pb.finish_and_clear();
        findings
    } else {
        Vec::new()
    };

    OutputManager::new(OutputConfig {
        format,
        file: None,
        colored: colored_output,
        show_closed: false,
    })
    .write_results(&result, &findings)?;

    if let Some(path) = matches.get_one::<String>("report") {
        OutputManager::new(OutputConfig {
            format: OutputFormat::Html,
            file: Some(path.clone()),
            colored: false,
            show_closed: false,
        })
        .write_results(&result, &findings)
        .with_context(|| format!("writing report to {}", path))?;
        println!("{} {}", "[~] HTML report written to".bright_blue(), path.bright_cyan());
    }

    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    if matches.subcommand_matches("plugins").is_some() {
        list_plugins();
        return Ok(());
    }

    let config = build_config(&matches)?;
    log::debug!("Effective configuration: {:?}", config);

    if let Some(name) = matches.get_one::<String>("plugin") {
        return run_plugin(name, &config, matches.contains_id("ports")).await;
    }

    run_scan(&matches, config).await
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "[!] Error:".bright_red().bold(), e);
        process::exit(1);
    }
}

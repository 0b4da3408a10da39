//! netpulse - network path health collector
//!
//! Usage:
//!   netpulse --config netpulse.toml
//!
//! Environment Variables:
//!   NETPULSE_CONFIG_PATH - Path to TOML config file
//!   NETPULSE_LOG_LEVEL - Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use netpulse::collectors::{IpinfoLookup, SpeedtestCliTester};
use netpulse::config::MonitorConfig;
use netpulse::export::CsvExporter;
use netpulse::monitor::{Collaborators, Monitor};
use netpulse::netinfo::{
    platform_routing_table, platform_signal_reader, ArpNeighborTable, SystemInterfaceResolver,
};
use netpulse::probe::PingProber;
use netpulse::store::SampleStore;

#[derive(Parser, Debug)]
#[command(name = "netpulse")]
#[command(about = "Periodic network path health measurement and recording")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "NETPULSE_CONFIG_PATH")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "NETPULSE_LOG_LEVEL")]
    log_level: String,

    /// Run exactly one collection cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("starting netpulse");

    let config = if let Some(config_path) = &args.config {
        info!("loading config from {config_path}");
        let content = tokio::fs::read_to_string(config_path)
            .await
            .with_context(|| format!("failed to read config {config_path}"))?;
        toml::from_str(&content).context("failed to parse config")?
    } else {
        info!("using default configuration");
        MonitorConfig::default()
    };

    let store = SampleStore::open(&config.db_path, &config.backup_path)
        .context("failed to initialize sample store")?;
    let exporter = CsvExporter::new(&config.export_path);

    let prober = Arc::new(PingProber::new(config.probe_timeout()));
    let collaborators = Collaborators {
        routing: platform_routing_table(),
        neighbor: Box::new(ArpNeighborTable::new(PingProber::new(
            config.probe_timeout(),
        ))),
        signal: platform_signal_reader(),
        bandwidth: Box::new(SpeedtestCliTester::new(config.external_timeout())),
        isp: Box::new(IpinfoLookup::new(
            config.isp_endpoint.clone(),
            config.isp_timeout(),
        )?),
        interface: Box::new(SystemInterfaceResolver),
    };

    let cancel = CancellationToken::new();
    let monitor = Monitor::new(
        config,
        prober,
        collaborators,
        store,
        exporter,
        cancel.clone(),
    );

    if args.once {
        let outcome = monitor.run_cycle().await;
        info!(?outcome, "single cycle complete");
        return Ok(());
    }

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
            shutdown.cancel();
        }
    });

    monitor.run().await;
    Ok(())
}

//! ALTAIR Node - balloon telemetry link supervisor
//!
//! Onboard, this binary checks the instruments, brings up the radios and
//! transmits telemetry on the primary radio, failing over to the backups
//! when it stops accepting frames. With `--ground-station` it only listens
//! and logs the positions it decodes.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use altair_core::{LogFormat, LoggingConfig, StaticSource};
use altair_node::{LinkSupervisor, NodeConfig, SimulatedInstrument};
use altair_telemetry::ReaderRole;

#[derive(Parser)]
#[command(name = "altair-node")]
#[command(about = "ALTAIR balloon telemetry link supervisor")]
struct Args {
    /// Configuration file (JSON)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    /// Listen for downlink frames instead of transmitting
    #[arg(long)]
    ground_station: bool,

    /// Do not bring up the first backup radio
    #[arg(long)]
    no_backup1: bool,

    /// Do not bring up the second backup radio
    #[arg(long)]
    no_backup2: bool,

    /// Stop after this many scheduling ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

fn init_logging(config: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.level.as_directive()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi);
    match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish())?,
    }
    Ok(())
}

#[cfg(feature = "serial")]
fn list_ports() -> anyhow::Result<()> {
    let ports = altair_telemetry::list_serial_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{port}");
    }
    Ok(())
}

#[cfg(not(feature = "serial"))]
fn list_ports() -> anyhow::Result<()> {
    anyhow::bail!("built without the `serial` feature")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if args.ground_station {
        config.telemetry.reader_role = ReaderRole::GroundStation;
    }
    if args.no_backup1 {
        config.telemetry.enable_backup1 = false;
    }
    if args.no_backup2 {
        config.telemetry.enable_backup2 = false;
    }

    init_logging(&config.logging, args.verbose)?;

    if args.list_ports {
        return list_ports();
    }

    info!(
        version = altair_telemetry::VERSION,
        role = ?config.telemetry.reader_role,
        backup1 = config.telemetry.enable_backup1,
        backup2 = config.telemetry.backup2_active(),
        "Starting ALTAIR node"
    );

    let result = if config.telemetry.reader_role == ReaderRole::GroundStation {
        // No instruments on the ground
        run(&config, StaticSource::default(), args.ticks).await
    } else {
        let instruments = SimulatedInstrument::new(config.instruments.clone());
        run(&config, instruments, args.ticks).await
    };

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Halting");
    }
    result
}

async fn run<S: altair_core::SnapshotSource>(
    config: &NodeConfig,
    source: S,
    ticks: Option<u64>,
) -> anyhow::Result<()> {
    let mut link = LinkSupervisor::boot(config, source)?;
    link.run(ticks).await
}

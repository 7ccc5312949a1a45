//! CLI entry point for pulse-daq.
//!
//! The `run` command plays the console hostware role: it wires the
//! simulated pulse source into the pipeline, starts the measurement, and
//! streams one text line per sample to stdout until Ctrl-C (or an optional
//! time limit), then prints a diagnostics summary.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use pulse_daq::{
    codec, telemetry, AcquisitionController, MockPulseSource, PulseDaqConfig, ReadError,
};

#[derive(Parser)]
#[command(name = "pulse-daq")]
#[command(about = "Pulse-counting acquisition pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the acquisition with the simulated pulse source, streaming
    /// samples to stdout
    Run {
        /// Path to a TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop automatically after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, seconds } => run(config, seconds).await,
    }
}

async fn run(config_path: Option<PathBuf>, seconds: Option<u64>) -> Result<()> {
    let config = match &config_path {
        Some(path) => PulseDaqConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PulseDaqConfig::load().context("failed to load configuration")?,
    };
    config.validate().map_err(|e| anyhow!(e))?;

    telemetry::init(&config.application.log_level)?;

    let (mut controller, mut gateway) = AcquisitionController::new(&config)?;
    let source = MockPulseSource::spawn(controller.event_input(), config.source.mean_rate_hz);

    controller.start().await?;

    // Ctrl-C surfaces to the blocked read as an interruption.
    let interrupt = gateway.interrupt_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.interrupt();
        }
    });

    let deadline = seconds.map(|s| tokio::time::Instant::now() + Duration::from_secs(s));
    let mut stdout = std::io::stdout();
    let mut total_events: u64 = 0;

    loop {
        let result = match deadline {
            Some(at) => match tokio::time::timeout_at(at, gateway.read(64, true)).await {
                Ok(result) => result,
                Err(_) => break,
            },
            None => gateway.read(64, true).await,
        };

        match result {
            Ok(samples) => {
                for sample in &samples {
                    stdout.write_all(codec::encode(sample).as_bytes())?;
                    total_events += sample.event_count;
                }
                stdout.flush()?;
            }
            Err(ReadError::Interrupted) => {
                info!("read interrupted, shutting down");
                break;
            }
            Err(ReadError::WouldBlock) => unreachable!("blocking read returned WouldBlock"),
        }
    }

    source.shutdown().await;
    controller.stop().await?;

    // Flush anything buffered between the last read and the stop.
    if let Ok(samples) = gateway.read(config.buffer.capacity, false).await {
        for sample in &samples {
            stdout.write_all(codec::encode(sample).as_bytes())?;
            total_events += sample.event_count;
        }
        stdout.flush()?;
    }

    let diag = controller.diagnostics();
    info!(
        total_events,
        ticks = diag.ticks,
        samples = diag.samples_produced,
        dropped = diag.samples_dropped,
        overruns = diag.timer_overruns,
        "measurement finished"
    );

    Ok(())
}

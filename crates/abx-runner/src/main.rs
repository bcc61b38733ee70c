//! # abx-runner
//!
//! Command-line entry point for the ABX feed client.
//!
//! Loads an optional JSON configuration file, applies command-line overrides,
//! streams the full packet set from the feed server, recovers gaps, and writes
//! the ordered dataset as JSON.
//!
//! # Usage
//!
//! ```bash
//! abx-runner config.json --log-level debug
//! abx-runner --host 10.0.0.5 --port 3000 --out captures/abx.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use abx_client::{JsonFileSink, TcpConnector};
use abx_core::config::{AppConfig, load_config};
use abx_core::logging::LogFormat;
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

/// ABX feed client: stream, recover gaps, write ordered JSON.
#[derive(Parser)]
#[command(name = "abx-runner", version, about = "ABX market-data feed client")]
struct Cli {
    /// Configuration file path (JSON). Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Feed server host.
    #[arg(long)]
    host: Option<String>,

    /// Feed server port.
    #[arg(long)]
    port: Option<u16>,

    /// Output file for the assembled records.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Log line format (text or json).
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Connect timeout in milliseconds.
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Per-frame receive timeout in milliseconds.
    #[arg(long)]
    recv_timeout_ms: Option<u64>,
}

impl Cli {
    /// Layer command-line overrides on top of the file config.
    fn apply(self, mut config: AppConfig) -> AppConfig {
        if self.host.is_some() {
            config.server.host = self.host;
        }
        if self.port.is_some() {
            config.server.port = self.port;
        }
        if self.connect_timeout_ms.is_some() {
            config.server.connect_timeout_ms = self.connect_timeout_ms;
        }
        if self.recv_timeout_ms.is_some() {
            config.server.recv_timeout_ms = self.recv_timeout_ms;
        }
        if self.out.is_some() {
            config.output.path = self.out;
        }
        if self.log_level.is_some() {
            config.logging.level = self.log_level;
        }
        if self.log_dir.is_some() {
            config.logging.log_dir = self.log_dir;
        }
        if self.log_format.is_some() {
            config.logging.format = self.log_format;
        }
        config
    }
}

fn load(cli: Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    let config = cli.apply(config);
    config.validate()?;
    Ok(config)
}

async fn fetch_and_save(config: &AppConfig) -> Result<()> {
    let connector = TcpConnector::new(config.server.address())
        .with_connect_timeout(config.server.connect_timeout())
        .with_recv_timeout(config.server.recv_timeout());
    let mut sink = JsonFileSink::new(config.output.effective_path());

    let report = abx_client::run(&connector, &mut sink).await?;
    info!(
        "done: streamed={} recovered={} unrecovered={} emitted={} last_sequence={}",
        report.streamed,
        report.recovery.recovered.len(),
        report.recovery.unrecovered.len(),
        report.emitted,
        report.max_sequence,
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match load(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("abx-runner: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    abx_core::logging::init_logging(
        config.logging.effective_level(),
        config.logging.log_dir.as_deref(),
        config.logging.effective_module_name(),
        config.logging.effective_format(),
    );

    info!(
        "abx-runner starting: server={}, output={}",
        config.server.address(),
        config.output.effective_path().display(),
    );

    match fetch_and_save(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("run aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

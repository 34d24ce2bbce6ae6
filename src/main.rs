use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use chatcast::config::Config;
use chatcast::controller::Controller;
use chatcast::logging::init_tracing;
use chatcast::shell::{Console, Shell};
use chatcast::transport::OscConnector;

/// Broadcast a chatbox message over OSC on a fixed interval.
#[derive(Parser, Debug)]
#[command(name = "chatcast")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "CHATCAST_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Receiver host
    #[arg(long)]
    host: Option<String>,

    /// Receiver UDP port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// OSC address messages are posted to
    #[arg(long)]
    address: Option<String>,

    /// Delay between two sends, in milliseconds
    #[arg(short = 'i', long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// File that records worker failures
    #[arg(long, value_name = "FILE")]
    error_log: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.destination.host = host;
        }
        if let Some(port) = self.port {
            config.destination.port = port;
        }
        if let Some(address) = self.address {
            config.destination.address = address;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.broadcast.interval_ms = interval_ms;
        }
        if let Some(error_log) = self.error_log {
            config.logging.error_log = error_log;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    init_tracing();

    let path = args.config.take().unwrap_or_else(Config::config_path);
    let mut config = Config::load_from(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    args.apply(&mut config);
    config.validate().context("Invalid command-line overrides")?;

    tracing::info!(
        host = %config.destination.host,
        port = config.destination.port,
        address = %config.destination.address,
        interval_ms = config.broadcast.interval_ms,
        "Starting chatcast"
    );

    let connector = Arc::new(OscConnector::from_config(&config.destination));
    let controller = Controller::from_config(&config, connector)
        .context("Failed to initialize message buffer")?;

    let mut shell = Shell::new(Arc::new(controller), Console::stdout());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let exit = shell.run(stdin).await;

    tracing::info!(code = exit.code(), "Exiting");
    std::process::exit(exit.code());
}

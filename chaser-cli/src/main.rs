// Chaser command line interface
// Runs the cup-chasing loop against the rover, or checks a configuration

use anyhow::Context;
use chaser_core::ChaserConfig;
use chaser_eye::{classes, HttpDetector, HttpSnapshotSource};
use chaser_motor::{CommandChannel, DryRunChannel, HttpCommandChannel};
use chaser_pursuit::PursuitDriver;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chaser")]
#[command(about = "Camera rover that finds a cup and drives to it", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pursuit loop
    Run {
        /// Rover base URL
        #[arg(long)]
        device: Option<String>,

        /// Detector endpoint URL
        #[arg(long)]
        detector: Option<String>,

        /// Log commands instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// Validate the configuration and print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ChaserConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ChaserConfig::default(),
    };
    config.apply_env()?;
    if let Some(level) = &cli.log_level {
        config.driver.log_level = level.clone();
    }

    match cli.command {
        Commands::Run {
            device,
            detector,
            dry_run,
            max_cycles,
        } => {
            if let Some(url) = device {
                config.device.base_url = url;
            }
            if let Some(url) = detector {
                config.detector.endpoint = url;
            }
            if max_cycles.is_some() {
                config.driver.max_cycles = max_cycles;
            }
            config.validate().context("Invalid configuration")?;
            init_logging(&config.driver.log_level);

            if dry_run {
                run(&config, DryRunChannel::new()).await
            } else {
                run(&config, HttpCommandChannel::new(&config.device)?).await
            }
        }
        Commands::CheckConfig => {
            config.validate().context("Invalid configuration")?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}

async fn run<C: CommandChannel>(config: &ChaserConfig, channel: C) -> anyhow::Result<()> {
    let source = HttpSnapshotSource::new(&config.device)?;
    let detector = HttpDetector::new(&config.detector)?;

    info!(
        "Chasing {:?} via {} (detector {})",
        config.detector.target_labels, config.device.base_url, config.detector.endpoint
    );

    for label in unknown_labels(&config.detector.target_labels) {
        warn!("Target label '{}' is not a COCO class; a stock detector never reports it", label);
    }

    let mut driver = PursuitDriver::new(config, source, detector, channel);
    let stats = driver.run_until(wait_for_shutdown()).await;

    if stats.cycles > 0 && stats.frames_skipped == stats.cycles {
        warn!("No frame was captured; check the device URL");
    }
    Ok(())
}

fn unknown_labels(labels: &[String]) -> Vec<&str> {
    labels
        .iter()
        .map(String::as_str)
        .filter(|label| !classes::is_known_label(label))
        .collect()
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "chaser",
            "--config",
            "rover.toml",
            "run",
            "--device",
            "http://10.0.0.5",
            "--dry-run",
            "--max-cycles",
            "20",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("rover.toml")));
        match cli.command {
            Commands::Run {
                device,
                dry_run,
                max_cycles,
                detector,
            } => {
                assert_eq!(device.as_deref(), Some("http://10.0.0.5"));
                assert!(dry_run);
                assert_eq!(max_cycles, Some(20));
                assert!(detector.is_none());
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_unknown_labels() {
        let labels = vec!["cup".to_string(), "mug".to_string(), "sports ball".to_string()];
        assert_eq!(unknown_labels(&labels), vec!["mug"]);
        assert!(unknown_labels(&ChaserConfig::default().detector.target_labels).is_empty());
    }

    #[test]
    fn test_parse_check_config() {
        let cli = Cli::parse_from(["chaser", "check-config", "--log-level", "debug"]);
        assert!(matches!(cli.command, Commands::CheckConfig));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use virtual_sensor::{Config, PublishOrchestrator};

#[derive(Parser)]
#[command(name = "virtual-sensor")]
#[command(about = "Simulated telemetry sensor publishing authenticated readings over MQTT")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity; RUST_LOG overrides the flags.
    let default_filter = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info,virtual_sensor=debug"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    tracing::info!(mode = ?config.mode, broker = %config.broker, "Virtual sensor configured");

    let orchestrator = PublishOrchestrator::new(config)?;
    let shutdown = orchestrator.shutdown_token();

    let mut run = tokio::spawn(orchestrator.run());
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
            shutdown.cancel();
            run.await??;
        }
        result = &mut run => result??,
    }

    tracing::info!("Virtual sensor exited.");
    Ok(())
}

//! Encode Supervisor CLI
//!
//! Runs the external video encoder under supervision.
//!
//! # Usage
//!
//! ```bash
//! encsup encode -i "intro.avi" -o "intro.usm" -b 2000 --audio "intro.wav"
//! encsup encode --job intro.toml --on-stall cancel --json
//! encsup args -i "intro.avi" -o "intro.usm" -b 2000 --replay
//! encsup preview -f "intro.usm" --extended
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use encode_supervisor::app::AppContainer;
use encode_supervisor::cli::{commands, Cli, Commands};
use encode_supervisor::utils::logging::{LogFormat, LoggingSystem};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = commands::load_config(&cli)?;
    let logging = LoggingSystem::new(
        loaded.config.logging.level.clone(),
        LogFormat::from_json_flag(loaded.config.logging.json),
    );
    logging.initialize()?;
    logging.log_system_info();
    loaded.log_summary();

    let container = AppContainer::new(loaded.config)?;

    match cli.command {
        Commands::Encode(args) => {
            info!("Executing encode command");
            let report = commands::encode(&container, args).await?;
            if !report.succeeded() {
                match report.reason {
                    Some(reason) => bail!("Encode {}", reason),
                    None => bail!("Encode ended without an exit status"),
                }
            }
        }
        Commands::Preview(args) => {
            info!("Executing preview command");
            commands::preview(&container, args)?;
        }
        Commands::Args(args) => {
            info!("Executing args command");
            commands::args(&container, args).await?;
        }
    }

    Ok(())
}

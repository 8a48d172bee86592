mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::{OutputOverrides, PartialAppConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(commands::check::exit_code(&e));
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!(
        "🚀 trajstream CLI v{} starting up.",
        env!("CARGO_PKG_VERSION")
    );
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let partial_config = PartialAppConfig::load(cli.config.as_deref())?;
    let progress = if cli.quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };

    let command_result = match cli.command {
        Commands::Info(args) => {
            info!("Dispatching to 'info' command.");
            let overrides = OutputOverrides {
                format: args.format,
                decimals: None,
            };
            let config = partial_config.merge_with_cli(&args.reader, overrides)?;
            commands::info::run(args, config, &progress)
        }
        Commands::Frames(args) => {
            info!("Dispatching to 'frames' command.");
            let overrides = OutputOverrides {
                format: args.format,
                decimals: args.decimals,
            };
            let config = partial_config.merge_with_cli(&args.reader, overrides)?;
            commands::frames::run(args, config, &progress)
        }
        Commands::Check(args) => {
            info!("Dispatching to 'check' command.");
            let config = partial_config.merge_with_cli(&args.reader, OutputOverrides::default())?;
            commands::check::run(args, config, &progress)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}

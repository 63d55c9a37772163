//! ndx-sound CLI
//!
//! Command-line interface for the ndx-sound extension.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use ndx_sound::cli::{commands, Cli, Commands};
use ndx_sound::config::ExtensionConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("ndx-sound v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("ndx-sound v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    let config = ExtensionConfig::default();
    match cmd {
        Commands::Generate => commands::generate(&config).context("failed to generate the schema"),
        Commands::Inspect => commands::inspect(&config).context("failed to load the namespace"),
        Commands::Mock { output } => commands::mock(&output)
            .with_context(|| format!("failed to write {}", output.display())),
        Commands::Show { path } => commands::show(&path)
            .with_context(|| format!("failed to read {}", path.display())),
    }
}

//! CLI Module
//!
//! Command-line interface for the ndx-sound extension.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ndx-sound - NWB extension for acoustic stimuli and responses
#[derive(Parser, Debug)]
#[command(name = "ndx-sound-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Regenerate the namespace and extensions YAML files
    #[command(name = "generate")]
    Generate,

    /// Load the installed namespace and print the bound types
    #[command(name = "inspect")]
    Inspect,

    /// Write a mock file with devices, tables and linked series
    #[command(name = "mock")]
    Mock {
        /// Output path for the file
        output: PathBuf,
    },

    /// Summarise the contents of a file
    #[command(name = "show")]
    Show {
        /// Path to the file
        path: PathBuf,
    },
}

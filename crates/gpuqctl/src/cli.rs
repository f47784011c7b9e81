//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// GPU capability report analysis
#[derive(Parser)]
#[command(name = "gpuqctl")]
#[command(about = "Which GPU requirements exclude which real devices", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides $XDG_CONFIG_HOME/gpuq/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the requirement waterfall over the report corpus
    Query {
        /// Data directory holding reports/
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// API registry used to resolve format and flag names
        #[arg(long)]
        vk_xml: Option<PathBuf>,

        /// Where to write the result file
        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Print only, do not write a result file
        #[arg(long)]
        no_save: bool,

        /// Output JSON only (the saved result stays plain text)
        #[arg(long)]
        json: bool,
    },

    /// List observed devices, grouped by architecture
    Devices {
        /// Data directory holding reports/
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Architecture taxonomy (gpu_info.json)
        #[arg(long)]
        gpu_info: Option<PathBuf>,

        /// Also list vendor 0, Apple and device 0
        #[arg(short, long)]
        all: bool,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Download reports not yet in the data directory
    Fetch {
        /// Data directory holding reports/
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Seconds to wait between downloads
        #[arg(long)]
        delay: Option<f64>,
    },
}

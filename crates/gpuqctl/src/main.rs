//! gpuqctl - command-line front end for gpuq
//!
//! Runs the requirement waterfall, lists observed devices by architecture,
//! and keeps the local report corpus up to date.

mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use gpuq_common::QueryConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = QueryConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Query {
            data_dir,
            vk_xml,
            results_dir,
            no_save,
            json,
        } => commands::query(config, data_dir, vk_xml, results_dir, no_save, json),
        Commands::Devices {
            data_dir,
            gpu_info,
            all,
            json,
        } => commands::devices(config, data_dir, gpu_info, all, json),
        Commands::Fetch { data_dir, delay } => commands::fetch(config, data_dir, delay),
    }
}

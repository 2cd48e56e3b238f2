mod backend;
mod cli;
mod clipboard;
mod config;
mod error;
mod file_scanner;
mod logging;
mod notify;
mod presets;
mod preview;
mod prompt;
mod refresh;
mod selection;
mod session;
mod tree;
mod tree_builder;
mod tui;
mod utils;
mod workflow;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // Handle daemon mode first. This should stay in main.rs as it's an early exit.
    if clipboard::check_and_run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();

    // Delegate the main application logic to the workflow module
    workflow::run(cli_args)
}

use clap::Parser;
use std::path::PathBuf;

/// promptpick – pick context files and presets, then generate a prompt
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the prompt server (overrides the config file)
    #[arg(long, value_name = "URL", conflicts_with = "local")]
    pub server: Option<String>,

    /// Serve the tree, presets and prompts in-process from this directory
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Include files ignored by .gitignore (local mode only)
    #[arg(long)]
    pub include_ignored: bool,

    /// Config file (defaults to <config dir>/promptpick/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Run without the TUI: apply --preset/--select, run the requested action and exit.
    #[arg(long)]
    pub headless: bool,

    /// Print the loaded file tree and the saved presets (headless)
    #[arg(long)]
    pub list: bool,

    /// Print the content of one file from the tree (headless)
    #[arg(long, value_name = "PATH")]
    pub preview: Option<String>,

    /// Preset to apply before anything else
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Select a file by its tree path. Can be repeated.
    #[arg(long = "select", value_name = "PATH")]
    pub select: Vec<String>,

    /// Remove a file from the selection after --preset is applied. Can be repeated.
    #[arg(long = "deselect", value_name = "PATH")]
    pub deselect: Vec<String>,

    /// Save the resulting selection as a preset (headless)
    #[arg(long, value_name = "NAME")]
    pub save_preset: Option<String>,

    /// Delete a preset (headless)
    #[arg(long, value_name = "NAME")]
    pub delete_preset: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Task description used for prompt generation
    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    /// Additional instructions used for prompt generation
    #[arg(long, value_name = "TEXT")]
    pub instructions: Option<String>,

    /// Server-side template to generate with
    #[arg(long, value_name = "ID")]
    pub template_id: Option<u32>,

    /// Export the generated prompt as markdown into this directory instead of copying it
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Print the generated prompt instead of copying it
    #[arg(long)]
    pub dry_run: bool,
}

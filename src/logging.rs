//! Tracing subscriber setup.
//!
//! The terminal UI owns stdout/stderr, so interactive sessions always log to
//! a file. Headless runs log warnings to stderr unless a file is given.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// `<cache dir>/promptpick/promptpick.log`, falling back to the temp dir.
pub fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("promptpick")
        .join("promptpick.log")
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn build_file_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter("info"))
}

/// Install the global subscriber. Returns the log file in use, if any.
pub fn init(log_file: Option<&Path>, interactive: bool) -> Result<Option<PathBuf>> {
    let path = match log_file {
        Some(path) => Some(path.to_path_buf()),
        None if interactive => Some(default_log_file()),
        None => None,
    };

    match &path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            build_file_subscriber(file).init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(env_filter("warn"))
                .init();
        }
    }
    Ok(path)
}

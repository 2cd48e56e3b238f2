use anyhow::{Result, bail};
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;
use tracing::{debug, warn};

pub const DAEMON_FLAG: &str = "__clipboard_daemon";

#[cfg(target_os = "linux")]
fn run_daemon_mode() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;

    let mut clipboard = Clipboard::new()?;
    // Blocks until another application takes ownership of the selection.
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the clipboard daemon when the process was spawned as one.
/// Returns `Ok(true)` if it did, in which case the caller should exit.
pub fn check_and_run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }
    #[cfg(target_os = "linux")]
    run_daemon_mode()?;
    #[cfg(not(target_os = "linux"))]
    warn!("{} flag used on non-Linux system. Ignoring.", DAEMON_FLAG);
    Ok(true)
}

/// Put a generated prompt on the system clipboard.
///
/// On Linux the selection only lives as long as its owner, so ownership is
/// handed to a detached copy of this binary.
pub fn copy_prompt(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        bail!("No content to copy");
    }

    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text.to_string())?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()?;

        let Some(mut stdin) = child.stdin.take() else {
            warn!("clipboard daemon has no stdin");
            bail!("Failed to get stdin for clipboard daemon");
        };
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
    }

    debug!(chars = text.chars().count(), "prompt copied to clipboard");
    Ok(())
}

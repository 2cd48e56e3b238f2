use crate::backend::{Backend, HttpBackend, LocalBackend};
use crate::config::Settings;
use crate::notify::{Level, Notice};
use crate::presets::Confirm;
use crate::preview::{PreviewBody, PreviewRequest};
use crate::refresh::RefreshOutcome;
use crate::session::Session;
use crate::tree::{NodeKind, TreeModel, TreeNode};
use crate::{cli, clipboard, logging, prompt, tui, utils};
use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Confirmation on the controlling terminal, or unconditional with `--yes`.
struct StdinConfirm {
    assume_yes: bool,
}

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn build_backend(settings: &Settings) -> Result<Arc<dyn Backend>> {
    match &settings.local {
        Some(local) => {
            let root = local
                .root
                .canonicalize()
                .with_context(|| format!("local root {} is not accessible", local.root.display()))?;
            info!(root = %root.display(), "serving tree in-process");
            Ok(Arc::new(LocalBackend::new(
                root,
                local.presets_file.clone(),
                local.include_ignored,
            )))
        }
        None => {
            info!(server = %settings.server_url, "using prompt server");
            let backend = HttpBackend::new(&settings.server_url, Some(settings.request_timeout))?;
            Ok(Arc::new(backend))
        }
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            Level::Success => println!("✅ {}", notice.message),
            Level::Info => println!("{}", notice.message),
            Level::Warning => eprintln!("⚠️ Warning: {}", notice.message),
            Level::Error => eprintln!("❌ {}", notice.message),
        }
    }
}

/// Indented listing of the rendered tree: folders end in `/`, files show
/// their path.
fn listing_lines(nodes: &[TreeNode], depth: usize, out: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node.kind {
            NodeKind::Folder => {
                out.push(format!("{}{}/", indent, node.name));
                listing_lines(&node.children, depth + 1, out);
            }
            NodeKind::File => {
                let path = node.identifier.as_deref().unwrap_or(&node.name);
                out.push(format!("{}{}", indent, path));
            }
        }
    }
}

fn print_listing(session: &Session) {
    let mut lines = Vec::new();
    listing_lines(&TreeModel::new(&session.tree).nodes(), 0, &mut lines);
    for line in lines {
        println!("{}", line);
    }
    let presets = session.presets.presets();
    if presets.is_empty() {
        println!("No presets saved.");
    } else {
        println!("Presets: {}", presets.keys().cloned().collect::<Vec<_>>().join(", "));
    }
}

async fn print_preview(session: &mut Session, backend: &dyn Backend, path: &str) -> Result<()> {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let request = session
        .preview
        .open(backend, path, filename, &mut session.toasts)
        .await;
    print_notices(session.toasts.drain());
    if let PreviewRequest::Refused = request {
        return Ok(());
    }
    match session.preview.current().map(|panel| &panel.body) {
        Some(PreviewBody::Content(content)) => println!("{}", content),
        Some(PreviewBody::Error(msg)) => bail!("{}", msg),
        _ => {}
    }
    session.preview.close();
    Ok(())
}

/// Copy, export or print the generated prompt.
fn deliver_prompt(text: &str, cli_args: &cli::Cli) -> Result<()> {
    if cli_args.dry_run {
        print!("{}", text);
        println!(
            "(Dry run: {} chars (≈ {} tokens). Clipboard not affected.)",
            text.chars().count(),
            utils::approx_tokens(text)
        );
    } else if let Some(dir) = &cli_args.export {
        let path = prompt::export(text, dir)?;
        println!("✅ Exported prompt to {}", path.display());
    } else {
        clipboard::copy_prompt(text)?;
        println!(
            "✅ Copied prompt (≈ {} tokens) to the clipboard.",
            utils::approx_tokens(text)
        );
    }
    Ok(())
}

async fn run_headless(
    cli_args: &cli::Cli,
    backend: &dyn Backend,
    session: &mut Session,
) -> Result<()> {
    let outcome = session.refresh(backend).await;
    print_notices(session.toasts.drain());
    if let RefreshOutcome::Failed(msg) = outcome {
        bail!("Could not load the file tree: {}", msg);
    }

    if let Some(path) = &cli_args.preview {
        print_preview(session, backend, path).await?;
    }

    let needs_presets = cli_args.list
        || cli_args.preset.is_some()
        || cli_args.save_preset.is_some()
        || cli_args.delete_preset.is_some();
    if needs_presets {
        let loaded = session.load_presets(backend).await;
        print_notices(session.toasts.drain());
        loaded?;
    }

    if let Some(name) = &cli_args.delete_preset {
        let mut confirm = StdinConfirm {
            assume_yes: cli_args.yes,
        };
        let deleted = session.delete_preset(backend, name, &mut confirm).await;
        print_notices(session.toasts.drain());
        if !deleted? {
            println!("Preset \"{}\" kept.", name);
        }
    }

    if let Some(name) = &cli_args.preset {
        let applied = session.apply_preset(Some(name));
        print_notices(session.toasts.drain());
        applied?;
    }
    for path in &cli_args.select {
        session.select_path(path);
    }
    for path in &cli_args.deselect {
        session.deselect_path(path);
    }
    print_notices(session.toasts.drain());

    if let Some(name) = &cli_args.save_preset {
        let saved = session.save_preset(backend, name).await;
        print_notices(session.toasts.drain());
        if let Err(e) = saved {
            if e.is_validation() {
                bail!("Cannot save preset \"{}\": {}", name, e);
            }
            return Err(e.into());
        }
    }

    if cli_args.list {
        print_listing(session);
    }

    let summary = session.selection.summary();
    println!("{}", summary.heading());
    for path in session.selected_paths() {
        println!("  {}", path);
    }

    if let Some(description) = &cli_args.description {
        let request = session.generate_request(
            description,
            cli_args.instructions.as_deref().unwrap_or_default(),
            cli_args.template_id,
        );
        let text = match session.generate(backend, &request).await {
            Ok(generated) => generated.text.clone(),
            Err(msg) => bail!(msg),
        };
        session.toasts.drain();
        deliver_prompt(&text, cli_args)?;
    }
    Ok(())
}

// Main orchestrator for the promptpick application logic.
pub fn run(cli_args: cli::Cli) -> Result<()> {
    let settings = Settings::load(&cli_args)?;
    let log_path = logging::init(settings.log_file.as_deref(), !cli_args.headless)?;
    if let Some(path) = &log_path {
        info!(log = %path.display(), "logging to file");
    }

    let runtime = Runtime::new().context("starting async runtime")?;
    let backend = build_backend(&settings)?;
    let mut session = Session::new(settings.notice_duration);

    if cli_args.headless {
        return runtime.block_on(run_headless(&cli_args, backend.as_ref(), &mut session));
    }

    let form = tui::PromptForm::new(
        cli_args.description.clone().unwrap_or_default(),
        cli_args.instructions.clone().unwrap_or_default(),
        cli_args.template_id,
    );
    let startup = tui::StartupSelection {
        preset: cli_args.preset.clone(),
        paths: cli_args.select.clone(),
        removed: cli_args.deselect.clone(),
    };
    let export_dir = cli_args
        .export
        .clone()
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    let session = tui::run_tui(
        session,
        backend,
        runtime.handle().clone(),
        form,
        startup,
        export_dir,
    )?;

    match &session.prompt {
        Some(generated) if cli_args.dry_run => deliver_prompt(&generated.text, &cli_args)?,
        _ => println!("{}", session.selection.summary().heading()),
    }
    Ok(())
}

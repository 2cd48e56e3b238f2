use super::app_state::{AppMode, PromptForm, StartupSelection};
use crate::backend::Backend;
use crate::notify::{Level, Notifier};
use crate::presets::SelectorEntry;
use crate::preview::PreviewRequest;
use crate::refresh::RefreshOutcome;
use crate::selection::SelectionSummary;
use crate::session::{Completion, Session};
use crate::tree::{ExpansionTracker, UnitId};
use crate::tree_builder::{self, TreeRow};
use crate::{clipboard, prompt};
use crossterm::event::{KeyCode, KeyEvent};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

pub struct TuiApp {
    pub(super) session: Session,
    backend: Arc<dyn Backend>,
    runtime: Handle,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    pub(super) cursor: usize,
    pub(super) scroll_offset: usize,
    pub(super) list_viewport_height: usize,
    pub(super) quit: bool,
    pub(super) mode: AppMode,
    pub(super) preset_cursor: usize,
    pub(super) summary_cursor: usize,
    pub(super) form: PromptForm,
    startup: Option<StartupSelection>,
    startup_pending: usize,
    export_dir: PathBuf,
}

impl TuiApp {
    pub fn new(
        session: Session,
        backend: Arc<dyn Backend>,
        runtime: Handle,
        form: PromptForm,
        startup: StartupSelection,
        export_dir: PathBuf,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        TuiApp {
            session,
            backend,
            runtime,
            tx,
            rx,
            cursor: 0,
            scroll_offset: 0,
            list_viewport_height: 0, // Will be updated by ui_renderer
            quit: false,
            mode: AppMode::Normal,
            preset_cursor: 0,
            summary_cursor: 0,
            form,
            startup: Some(startup),
            startup_pending: 2,
            export_dir,
        }
    }

    /// Kick off the initial tree and preset loads.
    pub(super) fn start(&mut self) {
        self.spawn_refresh();
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { Completion::Presets(backend.list_presets().await) });
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            // The receiver only goes away when the UI is shutting down.
            let _ = tx.send(request.await);
        });
    }

    pub(super) fn spawn_refresh(&mut self) {
        if self.session.refresh.is_loading() {
            debug!("superseding the refresh in flight");
        }
        let ticket = self.session.refresh.begin(&mut self.session.tree);
        let backend = Arc::clone(&self.backend);
        self.spawn(async move { Completion::Refresh(ticket, backend.refresh_tree().await) });
    }

    /// Apply every finished round-trip on the UI thread.
    pub(super) fn drain_completions(&mut self) {
        while let Ok(completion) = self.rx.try_recv() {
            let presets_loaded = matches!(completion, Completion::Presets(..));
            let refreshed = match self.session.apply(completion) {
                Some(RefreshOutcome::Stale) | None => false,
                Some(_) => true,
            };
            if presets_loaded || refreshed {
                self.startup_step_done();
            }
        }

        if self.mode == AppMode::SaveDialog && !self.session.presets.dialog().open {
            self.mode = AppMode::Normal;
        }
        let selected = self.session.selection.summary().count();
        if self.mode == AppMode::Summary && selected == 0 {
            self.mode = AppMode::Normal;
        }
        self.summary_cursor = self.summary_cursor.min(selected.saturating_sub(1));
        let rows = self.rows().len();
        self.cursor = self.cursor.min(rows.saturating_sub(1));
        self.session.toasts.prune(Instant::now());
    }

    /// The startup selection waits for the first applied tree and the preset
    /// list. A stale refresh reply does not count.
    fn startup_step_done(&mut self) {
        if self.startup.is_none() {
            return;
        }
        self.startup_pending = self.startup_pending.saturating_sub(1);
        if self.startup_pending == 0 {
            self.apply_startup_selection();
        }
    }

    fn apply_startup_selection(&mut self) {
        let Some(startup) = self.startup.take() else {
            return;
        };
        if let Some(name) = startup.preset.as_deref() {
            let _ = self.session.apply_preset(Some(name));
        }
        for path in &startup.paths {
            self.session.select_path(path);
        }
        for path in &startup.removed {
            self.session.deselect_path(path);
        }
    }

    pub(super) fn rows(&self) -> Vec<TreeRow> {
        tree_builder::build_rows(&self.session.tree)
    }

    fn current_unit(&self) -> Option<UnitId> {
        self.rows().get(self.cursor).map(|row| row.unit)
    }

    pub(super) fn move_cursor(&mut self, delta: i32) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as i32 + delta).rem_euclid(len as i32) as usize;
    }

    pub(super) fn ensure_cursor_is_visible_in_viewport(&mut self) {
        let len = self.rows().len();
        let height = self.list_viewport_height;
        if len == 0 || height == 0 {
            self.scroll_offset = 0;
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + height {
            self.scroll_offset = self.cursor.saturating_sub(height - 1);
        }
        if len <= height {
            self.scroll_offset = 0;
        } else {
            self.scroll_offset = self.scroll_offset.min(len - height);
        }
    }

    fn toggle_current_selection(&mut self) {
        let Some(unit) = self.current_unit() else { return };
        let session = &mut self.session;
        if session.tree.file(unit).is_some() {
            session.selection.toggle(&mut session.tree, unit);
        } else {
            ExpansionTracker::toggle(&mut session.tree, unit);
        }
    }

    fn open_current(&mut self) {
        let Some(unit) = self.current_unit() else { return };
        if self.session.tree.folder(unit).is_some() {
            ExpansionTracker::toggle(&mut self.session.tree, unit);
        } else {
            self.preview_current();
        }
    }

    fn preview_current(&mut self) {
        let Some(file) = self.current_unit().and_then(|unit| self.session.tree.file(unit)) else {
            return;
        };
        let (path, name) = (file.control.value.clone(), file.name.clone());
        let request = self
            .session
            .preview
            .request(&path, &name, &mut self.session.toasts);
        if let PreviewRequest::Load(path) = request {
            let backend = Arc::clone(&self.backend);
            self.spawn(async move {
                let reply = backend.file_content(&path).await;
                Completion::Preview(path, reply)
            });
        }
    }

    fn copy_prompt(&mut self) {
        let text = self.session.prompt.as_ref().map_or("", |p| p.text.as_str());
        match clipboard::copy_prompt(text) {
            Ok(()) => self
                .session
                .toasts
                .notify(Level::Success, "Prompt copied to clipboard".to_string()),
            Err(e) => self.session.toasts.notify(Level::Error, e.to_string()),
        }
    }

    fn export_prompt(&mut self) {
        let text = self.session.prompt.as_ref().map_or("", |p| p.text.as_str());
        match prompt::export(text, &self.export_dir) {
            Ok(path) => self
                .session
                .toasts
                .notify(Level::Success, format!("Exported prompt to {}", path.display())),
            Err(e) => self.session.toasts.notify(Level::Error, e.to_string()),
        }
    }

    fn generate(&mut self) {
        let request = self.session.generate_request(
            &self.form.description,
            &self.form.instructions,
            self.form.template_id,
        );
        debug!(files = request.context_files.len(), "generating prompt");
        self.session
            .toasts
            .notify(Level::Info, "Generating prompt...".to_string());
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            Completion::Generated(prompt::generate(backend.as_ref(), &request).await)
        });
    }

    pub(super) fn handle_normal_mode_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.session.preview.current().is_some() {
                    self.session.preview.close();
                } else {
                    self.quit = true;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Char(' ') => self.toggle_current_selection(),
            KeyCode::Enter | KeyCode::Tab | KeyCode::Char('o') => self.open_current(),
            KeyCode::Char('p') => self.preview_current(),
            KeyCode::Char('r') => self.spawn_refresh(),
            KeyCode::Char('*') => ExpansionTracker::expand_all(&mut self.session.tree),
            KeyCode::Char('-') => ExpansionTracker::collapse_all(&mut self.session.tree),
            KeyCode::Char('c') => {
                let session = &mut self.session;
                session.selection.clear_all(&mut session.tree);
            }
            KeyCode::Char('l') => {
                self.preset_cursor = 0;
                self.mode = AppMode::Presets;
            }
            KeyCode::Char('x') if self.session.selection.summary().count() > 0 => {
                self.summary_cursor = 0;
                self.mode = AppMode::Summary;
            }
            KeyCode::Char('s') if self.session.presets.save_trigger_visible() => {
                if self.session.open_save_dialog() {
                    self.mode = AppMode::SaveDialog;
                }
            }
            KeyCode::Char('g') => self.mode = AppMode::PromptForm,
            KeyCode::Char('y') => self.copy_prompt(),
            KeyCode::Char('e') => self.export_prompt(),
            _ => {}
        }
    }

    pub(super) fn handle_presets_mode_input(&mut self, key_event: KeyEvent) {
        let entries = self.session.presets.selector().entries().to_vec();
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = AppMode::Normal,
            KeyCode::Down | KeyCode::Char('j') => {
                self.preset_cursor = (self.preset_cursor + 1) % entries.len().max(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.preset_cursor = (self.preset_cursor + entries.len().max(1) - 1)
                    % entries.len().max(1);
            }
            KeyCode::Enter => {
                let name = match entries.get(self.preset_cursor) {
                    Some(SelectorEntry::Preset { name }) => Some(name.as_str()),
                    _ => None,
                };
                let _ = self.session.apply_preset(name);
                self.mode = AppMode::Normal;
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(SelectorEntry::Preset { name }) = entries.get(self.preset_cursor) {
                    self.mode = AppMode::ConfirmDelete { name: name.clone() };
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_summary_input(&mut self, key_event: KeyEvent) {
        let paths: Vec<String> = match self.session.selection.summary() {
            SelectionSummary::Listed(items) => items.iter().map(|item| item.path.clone()).collect(),
            SelectionSummary::Empty { .. } => Vec::new(),
        };
        let len = paths.len().max(1);
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = AppMode::Normal,
            KeyCode::Down | KeyCode::Char('j') => {
                self.summary_cursor = (self.summary_cursor + 1) % len;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.summary_cursor = (self.summary_cursor + len - 1) % len;
            }
            KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => {
                if let Some(path) = paths.get(self.summary_cursor) {
                    self.session.deselect_path(path);
                }
                let remaining = self.session.selection.summary().count();
                if remaining == 0 {
                    self.mode = AppMode::Normal;
                }
                self.summary_cursor = self.summary_cursor.min(remaining.saturating_sub(1));
            }
            _ => {}
        }
    }

    pub(super) fn handle_confirm_input(&mut self, key_event: KeyEvent) {
        let AppMode::ConfirmDelete { name } = &self.mode else {
            return;
        };
        let name = name.clone();
        match key_event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let backend = Arc::clone(&self.backend);
                self.spawn(async move {
                    let reply = backend.delete_preset(&name).await;
                    Completion::Deleted(name, reply)
                });
                self.preset_cursor = 0;
                self.mode = AppMode::Presets;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = AppMode::Presets;
            }
            _ => {}
        }
    }

    pub(super) fn handle_save_dialog_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.session.presets.close_dialog();
                self.mode = AppMode::Normal;
            }
            KeyCode::Enter => {
                if self.session.presets.is_saving() {
                    return;
                }
                let name = self.session.presets.dialog().name.clone();
                if let Ok(request) = self.session.begin_save(&name) {
                    let backend = Arc::clone(&self.backend);
                    self.spawn(async move {
                        let reply = backend.save_preset(&request).await;
                        Completion::Saved(request, reply)
                    });
                }
            }
            KeyCode::Backspace => {
                self.session.presets.dialog_mut().name.pop();
            }
            KeyCode::Char(c) => self.session.presets.dialog_mut().name.push(c),
            _ => {}
        }
    }

    pub(super) fn handle_prompt_form_input(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => self.mode = AppMode::Normal,
            KeyCode::Tab => self.form.cycle_focus(),
            KeyCode::Enter => {
                self.generate();
                self.mode = AppMode::Normal;
            }
            KeyCode::Backspace => {
                self.form.focused_mut().pop();
            }
            KeyCode::Char(c) => self.form.focused_mut().push(c),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HttpReply;
    use crate::backend::fake::FakeBackend;
    use crate::error::BackendError;
    use crate::tree::MarkupNode;
    use serde_json::json;
    use std::time::Duration;
    use tokio::runtime::Runtime;

    fn test_app(runtime: &Runtime, startup: StartupSelection) -> TuiApp {
        TuiApp::new(
            Session::new(Duration::from_secs(3)),
            Arc::new(FakeBackend::new()),
            runtime.handle().clone(),
            PromptForm::default(),
            startup,
            PathBuf::from("."),
        )
    }

    fn tree_reply() -> Result<HttpReply, BackendError> {
        Ok(HttpReply::ok_json(&json!({
            "markup": [MarkupNode::file("a.rs", "a.rs"), MarkupNode::file("b.rs", "b.rs")]
        })))
    }

    #[test]
    fn summary_mode_removes_the_highlighted_file() {
        let runtime = Runtime::new().unwrap();
        let mut app = test_app(&runtime, StartupSelection::default());
        let ticket = app.session.refresh.begin(&mut app.session.tree);
        app.session.apply(Completion::Refresh(ticket, tree_reply()));
        app.session.select_path("a.rs");
        app.session.select_path("b.rs");

        let key = |code| KeyEvent::from(code);
        app.handle_normal_mode_input(key(KeyCode::Char('x')));
        assert_eq!(app.mode, AppMode::Summary);
        app.handle_summary_input(key(KeyCode::Down));
        app.handle_summary_input(key(KeyCode::Char('d')));
        assert_eq!(app.session.selected_paths(), vec!["a.rs"]);
        assert_eq!(app.summary_cursor, 0);

        app.handle_summary_input(key(KeyCode::Char('d')));
        assert!(app.session.selected_paths().is_empty());
        assert_eq!(app.mode, AppMode::Normal);
    }

    fn deliver(app: &TuiApp, completion: Completion) {
        assert!(app.tx.send(completion).is_ok());
    }

    #[test]
    fn startup_selection_waits_for_the_latest_refresh() {
        let runtime = Runtime::new().unwrap();
        let mut app = test_app(
            &runtime,
            StartupSelection {
                paths: vec!["a.rs".into()],
                ..Default::default()
            },
        );
        let first = app.session.refresh.begin(&mut app.session.tree);
        let second = app.session.refresh.begin(&mut app.session.tree);

        deliver(&app, Completion::Refresh(first, tree_reply()));
        deliver(
            &app,
            Completion::Presets(Ok(HttpReply::ok_json(&json!({ "presets": {} })))),
        );
        app.drain_completions();
        assert!(app.startup.is_some());
        assert!(app.session.selected_paths().is_empty());

        deliver(&app, Completion::Refresh(second, tree_reply()));
        app.drain_completions();
        assert!(app.startup.is_none());
        assert_eq!(app.session.selected_paths(), vec!["a.rs"]);
    }
}

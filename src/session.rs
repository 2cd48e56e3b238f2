//! One picker session: every stateful component, mutated from a single
//! execution context.
//!
//! The async methods run a whole round-trip inline (headless use). The
//! terminal UI instead sends requests from spawned tasks and feeds the
//! replies back through [`Session::apply`].

use crate::backend::{Backend, GenerateRequest, HttpReply, PresetRequest};
use crate::error::{BackendError, PresetError};
use crate::notify::{Level, Notifier, ToastQueue};
use crate::presets::{Confirm, PresetManager};
use crate::preview::Preview;
use crate::prompt::{self, GeneratedPrompt};
use crate::refresh::{RefreshOrchestrator, RefreshOutcome, RefreshTicket};
use crate::selection::{SelectionEntry, SelectionStore};
use crate::tree::FileTree;
use std::time::Duration;

/// A finished backend round-trip waiting to be applied.
pub enum Completion {
    Refresh(RefreshTicket, Result<HttpReply, BackendError>),
    Presets(Result<HttpReply, BackendError>),
    Saved(PresetRequest, Result<HttpReply, BackendError>),
    Deleted(String, Result<HttpReply, BackendError>),
    Preview(String, Result<HttpReply, BackendError>),
    Generated(Result<GeneratedPrompt, String>),
}

pub struct Session {
    pub tree: FileTree,
    pub selection: SelectionStore,
    pub refresh: RefreshOrchestrator,
    pub presets: PresetManager,
    pub preview: Preview,
    pub toasts: ToastQueue,
    pub prompt: Option<GeneratedPrompt>,
}

impl Session {
    pub fn new(notice_duration: Duration) -> Self {
        let selection = SelectionStore::new();
        let presets = PresetManager::new(selection.subscribe());
        Session {
            tree: FileTree::new(),
            selection,
            refresh: RefreshOrchestrator::new(),
            presets,
            preview: Preview::new(),
            toasts: ToastQueue::new(notice_duration),
            prompt: None,
        }
    }

    pub fn selected(&self) -> Vec<SelectionEntry> {
        SelectionStore::capture(&self.tree)
    }

    pub fn selected_paths(&self) -> Vec<String> {
        self.selected().into_iter().map(|entry| entry.path).collect()
    }

    pub fn generate_request(
        &self,
        description: &str,
        instructions: &str,
        template_id: Option<u32>,
    ) -> GenerateRequest {
        GenerateRequest {
            context_files: self.selected_paths(),
            jira_description: description.to_string(),
            additional_instructions: instructions.to_string(),
            template_id,
        }
    }

    /// Select a rendered file by path; unknown paths produce a warning.
    pub fn select_path(&mut self, path: &str) -> bool {
        match self.selection.add_file(&mut self.tree, path) {
            Some(name) => {
                self.toasts
                    .notify(Level::Success, format!("Added \"{}\"", name));
                true
            }
            None => {
                self.toasts
                    .notify(Level::Warning, format!("File not found in tree: {}", path));
                false
            }
        }
    }

    pub fn deselect_path(&mut self, path: &str) -> bool {
        self.selection.remove(&mut self.tree, path)
    }

    pub fn apply_preset(&mut self, name: Option<&str>) -> Result<usize, PresetError> {
        self.presets
            .apply(name, &mut self.tree, &mut self.selection, &mut self.toasts)
    }

    pub fn open_save_dialog(&mut self) -> bool {
        let selected = self.selected();
        self.presets.open_dialog(&selected, &mut self.toasts)
    }

    pub fn begin_save(&mut self, name: &str) -> Result<PresetRequest, PresetError> {
        let selected = self.selected();
        self.presets.begin_save(name, &selected)
    }

    /// Apply a finished round-trip. Refresh completions report their outcome.
    pub fn apply(&mut self, completion: Completion) -> Option<RefreshOutcome> {
        match completion {
            Completion::Refresh(ticket, reply) => {
                return Some(self.refresh.complete(
                    ticket,
                    reply,
                    &mut self.tree,
                    &mut self.selection,
                    &mut self.toasts,
                ));
            }
            Completion::Presets(reply) => {
                let _ = self.presets.load(reply, &mut self.toasts);
            }
            Completion::Saved(request, reply) => {
                let _ = self.presets.finish_save(&request, reply, &mut self.toasts);
            }
            Completion::Deleted(name, reply) => {
                let _ = self.presets.finish_delete(&name, reply, &mut self.toasts);
            }
            Completion::Preview(path, reply) => self.preview.finish(&path, reply),
            Completion::Generated(result) => self.finish_generate(result),
        }
        None
    }

    fn finish_generate(&mut self, result: Result<GeneratedPrompt, String>) {
        match result {
            Ok(generated) => {
                self.toasts.notify(
                    Level::Success,
                    format!(
                        "Prompt generated ({} chars, ≈ {} tokens)",
                        generated.char_count, generated.token_estimate
                    ),
                );
                self.prompt = Some(generated);
            }
            Err(msg) => self.toasts.notify(Level::Error, msg),
        }
    }

    pub async fn refresh(&mut self, backend: &dyn Backend) -> RefreshOutcome {
        self.refresh
            .refresh(backend, &mut self.tree, &mut self.selection, &mut self.toasts)
            .await
    }

    pub async fn load_presets(&mut self, backend: &dyn Backend) -> Result<(), PresetError> {
        let reply = backend.list_presets().await;
        self.presets.load(reply, &mut self.toasts)
    }

    pub async fn save_preset(
        &mut self,
        backend: &dyn Backend,
        name: &str,
    ) -> Result<(), PresetError> {
        let selected = self.selected();
        self.presets
            .save(backend, name, &selected, &mut self.toasts)
            .await
    }

    pub async fn delete_preset(
        &mut self,
        backend: &dyn Backend,
        name: &str,
        confirm: &mut dyn Confirm,
    ) -> Result<bool, PresetError> {
        self.presets
            .delete(backend, name, confirm, &mut self.toasts)
            .await
    }

    pub async fn generate(
        &mut self,
        backend: &dyn Backend,
        request: &GenerateRequest,
    ) -> Result<&GeneratedPrompt, String> {
        let result = prompt::generate(backend, request).await;
        let failed = result.as_ref().err().cloned();
        self.finish_generate(result);
        if let Some(msg) = failed {
            return Err(msg);
        }
        self.prompt
            .as_ref()
            .ok_or_else(|| "No content to copy".to_string())
    }
}

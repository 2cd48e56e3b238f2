//! Named, server-persisted selection snapshots.
//!
//! The cached mapping is owned here and only ever replaced wholesale with the
//! copy a server acknowledgement carries.

use crate::backend::{Backend, HttpReply, PresetRequest};
use crate::error::{BackendError, PresetError};
use crate::notify::{Level, Notifier};
use crate::selection::{SelectionEntry, SelectionStore};
use crate::tree::FileTree;
use crate::utils;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Preset name -> raw preset value as the server sent it. Kept raw so a
/// malformed entry is only rejected when someone tries to apply it.
pub type PresetMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: String,
    pub files: Vec<String>,
}

impl Preset {
    pub fn from_map(presets: &PresetMap, name: &str) -> Result<Preset, PresetError> {
        let files = presets
            .get(name)
            .and_then(|value| value.get("files"))
            .and_then(Value::as_array)
            .ok_or(PresetError::InvalidPreset)?;
        Ok(Preset {
            name: name.to_string(),
            files: files
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect(),
        })
    }
}

/// Interactive confirmation before a destructive request.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorEntry {
    None,
    /// A saved preset; every one carries a delete affordance.
    Preset { name: String },
}

impl SelectorEntry {
    pub fn label(&self) -> &str {
        match self {
            SelectorEntry::None => "None",
            SelectorEntry::Preset { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetSelector {
    entries: Vec<SelectorEntry>,
    active: usize,
}

impl Default for PresetSelector {
    fn default() -> Self {
        PresetSelector::rebuild(&PresetMap::new())
    }
}

impl PresetSelector {
    /// "None" first, then one entry per preset. The active choice resets to
    /// "None".
    pub fn rebuild(presets: &PresetMap) -> Self {
        let mut entries = vec![SelectorEntry::None];
        entries.extend(
            presets
                .keys()
                .map(|name| SelectorEntry::Preset { name: name.clone() }),
        );
        PresetSelector { entries, active: 0 }
    }

    pub fn entries(&self) -> &[SelectorEntry] {
        &self.entries
    }

    pub fn active(&self) -> &SelectorEntry {
        &self.entries[self.active]
    }

    fn activate(&mut self, name: Option<&str>) {
        self.active = name
            .and_then(|name| {
                self.entries
                    .iter()
                    .position(|entry| matches!(entry, SelectorEntry::Preset { name: n } if n == name))
            })
            .unwrap_or(0);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveDialog {
    pub open: bool,
    pub name: String,
    pub error: Option<String>,
    /// Display names of the files about to be saved.
    pub files_summary: Vec<String>,
}

pub struct PresetManager {
    presets: PresetMap,
    selector: PresetSelector,
    dialog: SaveDialog,
    saving: bool,
    selection_count: watch::Receiver<usize>,
}

impl PresetManager {
    pub fn new(selection_count: watch::Receiver<usize>) -> Self {
        PresetManager {
            presets: PresetMap::new(),
            selector: PresetSelector::default(),
            dialog: SaveDialog::default(),
            saving: false,
            selection_count,
        }
    }

    pub fn presets(&self) -> &PresetMap {
        &self.presets
    }

    pub fn selector(&self) -> &PresetSelector {
        &self.selector
    }

    pub fn dialog(&self) -> &SaveDialog {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut SaveDialog {
        &mut self.dialog
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// The "save as preset" trigger follows the published selection count.
    pub fn save_trigger_visible(&self) -> bool {
        *self.selection_count.borrow() > 0
    }

    fn replace_presets(&mut self, presets: PresetMap) {
        info!(count = presets.len(), "preset cache replaced");
        self.presets = presets;
        self.rebuild_selector();
    }

    pub fn rebuild_selector(&mut self) {
        self.selector = PresetSelector::rebuild(&self.presets);
    }

    /// Populate the cache from `GET /presets`.
    pub fn load(
        &mut self,
        reply: Result<HttpReply, BackendError>,
        notifier: &mut dyn Notifier,
    ) -> Result<(), PresetError> {
        let result = match reply {
            Ok(reply) => presets_from_reply(&reply),
            Err(e) => Err(PresetError::Transport(e.to_string())),
        };
        match result {
            Ok(presets) => {
                self.replace_presets(presets);
                Ok(())
            }
            Err(e) => {
                notifier.notify(Level::Error, format!("Error loading presets: {}", e));
                Err(e)
            }
        }
    }

    /// Replace the selection with a preset's files. `None` or an empty name
    /// only clears.
    pub fn apply(
        &mut self,
        name: Option<&str>,
        tree: &mut FileTree,
        selection: &mut SelectionStore,
        notifier: &mut dyn Notifier,
    ) -> Result<usize, PresetError> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            selection.clear_all(tree);
            self.selector.activate(None);
            return Ok(0);
        };

        let preset = match Preset::from_map(&self.presets, name) {
            Ok(preset) => preset,
            Err(e) => {
                notifier.notify(Level::Error, e.to_string());
                return Err(e);
            }
        };

        SelectionStore::uncheck_all(tree);
        let mut matched = 0;
        for path in &preset.files {
            if SelectionStore::set_checked_by_value(tree, path, true) {
                matched += 1;
            } else {
                debug!(preset = %name, path = %path, "preset file not in tree");
            }
        }
        selection.recompute(tree);
        self.selector.activate(Some(name));
        notifier.notify(Level::Success, format!("Loaded preset \"{}\"", name));
        Ok(matched)
    }

    /// Open the creation dialog for the current selection.
    pub fn open_dialog(&mut self, selection: &[SelectionEntry], notifier: &mut dyn Notifier) -> bool {
        if selection.is_empty() {
            notifier.notify(Level::Error, PresetError::EmptySelection.to_string());
            return false;
        }
        self.dialog = SaveDialog {
            open: true,
            name: String::new(),
            error: None,
            files_summary: selection.iter().map(display_name).collect(),
        };
        true
    }

    pub fn close_dialog(&mut self) {
        self.dialog.open = false;
    }

    /// Validate and build the create/update request. Validation failures are
    /// shown in the dialog and no request is produced.
    pub fn begin_save(
        &mut self,
        name: &str,
        selection: &[SelectionEntry],
    ) -> Result<PresetRequest, PresetError> {
        if self.saving {
            return Err(PresetError::SaveInFlight);
        }
        self.dialog.error = None;

        let result = build_request(name, selection);
        match &result {
            Ok(_) => self.saving = true,
            Err(e) => self.dialog.error = Some(e.to_string()),
        }
        result
    }

    pub fn finish_save(
        &mut self,
        request: &PresetRequest,
        reply: Result<HttpReply, BackendError>,
        notifier: &mut dyn Notifier,
    ) -> Result<(), PresetError> {
        self.saving = false;

        let result = match reply {
            Ok(reply) if reply.is_success() => presets_from_reply(&reply),
            Ok(reply) => Err(PresetError::Server(format!(
                "Error saving preset: {}",
                protocol_message(&reply)
            ))),
            Err(e) => Err(PresetError::Transport(format!("Error saving preset: {}", e))),
        };

        match result {
            Ok(presets) => {
                self.replace_presets(presets);
                self.close_dialog();
                notifier.notify(
                    Level::Success,
                    format!("Preset \"{}\" saved successfully", request.name),
                );
                Ok(())
            }
            Err(e) => {
                warn!(name = %request.name, error = %e, "preset save failed");
                self.dialog.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn save(
        &mut self,
        backend: &dyn Backend,
        name: &str,
        selection: &[SelectionEntry],
        notifier: &mut dyn Notifier,
    ) -> Result<(), PresetError> {
        let request = self.begin_save(name, selection)?;
        let reply = backend.save_preset(&request).await;
        self.finish_save(&request, reply, notifier)
    }

    /// Ask for confirmation; `true` means the delete request may be sent.
    pub fn request_delete(&self, name: &str, confirm: &mut dyn Confirm) -> bool {
        confirm.confirm(&delete_prompt(name))
    }

    pub fn finish_delete(
        &mut self,
        name: &str,
        reply: Result<HttpReply, BackendError>,
        notifier: &mut dyn Notifier,
    ) -> Result<(), PresetError> {
        let result = match reply {
            Ok(reply) => match reply.json() {
                Some(_) => presets_from_reply(&reply)
                    .map_err(|e| PresetError::Server(format!("Error: {}", e))),
                None => Err(PresetError::Server(format!(
                    "Error deleting preset: {}",
                    protocol_message(&reply)
                ))),
            },
            Err(e) => Err(PresetError::Transport(format!("Error deleting preset: {}", e))),
        };

        match result {
            Ok(presets) => {
                self.replace_presets(presets);
                notifier.notify(Level::Success, format!("Preset \"{}\" deleted", name));
                Ok(())
            }
            Err(e) => {
                notifier.notify(Level::Error, e.to_string());
                Err(e)
            }
        }
    }

    /// Returns `Ok(false)` when the user declined and nothing was sent.
    pub async fn delete(
        &mut self,
        backend: &dyn Backend,
        name: &str,
        confirm: &mut dyn Confirm,
        notifier: &mut dyn Notifier,
    ) -> Result<bool, PresetError> {
        if !self.request_delete(name, confirm) {
            debug!(name, "preset delete declined");
            return Ok(false);
        }
        let reply = backend.delete_preset(name).await;
        self.finish_delete(name, reply, notifier).map(|_| true)
    }
}

pub fn delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete the preset \"{}\"?", name)
}

fn display_name(entry: &SelectionEntry) -> String {
    if !entry.filename.is_empty() {
        return entry.filename.clone();
    }
    entry
        .path
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("Unknown file")
        .to_string()
}

fn build_request(name: &str, selection: &[SelectionEntry]) -> Result<PresetRequest, PresetError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PresetError::EmptyName);
    }
    if selection.is_empty() {
        return Err(PresetError::EmptySelection);
    }
    let files: Vec<String> = selection
        .iter()
        .filter(|entry| !entry.path.trim().is_empty())
        .map(|entry| entry.path.clone())
        .collect();
    if files.is_empty() {
        return Err(PresetError::NoValidPaths);
    }
    Ok(PresetRequest {
        name: name.to_string(),
        files,
    })
}

/// Human-readable message for a reply that did not succeed.
fn protocol_message(reply: &HttpReply) -> String {
    if let Some(body) = reply.json() {
        return body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Server error")
            .to_string();
    }
    if reply.body.to_ascii_lowercase().contains("<!doctype") {
        return "Server error: Received HTML instead of JSON".to_string();
    }
    format!("Server error: {}", utils::truncate_chars(&reply.body, 100))
}

/// The authoritative mapping carried by a mutation or listing reply.
fn presets_from_reply(reply: &HttpReply) -> Result<PresetMap, PresetError> {
    let Some(body) = reply.json() else {
        return Err(PresetError::Server(protocol_message(reply)));
    };
    if let Some(error) = body.get("error").and_then(Value::as_str) {
        return Err(PresetError::Server(error.to_string()));
    }
    if !reply.is_success() {
        return Err(PresetError::Server("Server error".to_string()));
    }
    match body.get("presets") {
        Some(Value::Object(map)) => Ok(map.clone().into_iter().collect()),
        _ => Err(PresetError::Server(
            "Server error: response did not include presets".to_string(),
        )),
    }
}

use crate::tree::dom::control_id_for;
use crate::tree::{FileTree, UnitId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

pub const EMPTY_SELECTION_PLACEHOLDER: &str =
    "No files selected yet. Press Space on a file to add it.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub path: String,
    pub filename: String,
}

/// One line of the "selected files" panel. Removing it goes through
/// `SelectionStore::remove` with `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionSummary {
    Empty { placeholder: &'static str },
    Listed(Vec<SummaryItem>),
}

impl SelectionSummary {
    pub fn count(&self) -> usize {
        match self {
            SelectionSummary::Empty { .. } => 0,
            SelectionSummary::Listed(items) => items.len(),
        }
    }

    pub fn heading(&self) -> String {
        match self.count() {
            1 => "1 file selected".to_string(),
            n => format!("{} files selected", n),
        }
    }
}

/// Selected leaves live on the rendered controls; this store derives the
/// summary from them and publishes the count whenever it is recomputed.
#[derive(Debug)]
pub struct SelectionStore {
    summary: SelectionSummary,
    count_tx: watch::Sender<usize>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);
        SelectionStore {
            summary: SelectionSummary::Empty {
                placeholder: EMPTY_SELECTION_PLACEHOLDER,
            },
            count_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.count_tx.subscribe()
    }

    pub fn summary(&self) -> &SelectionSummary {
        &self.summary
    }

    fn checked_units(tree: &FileTree) -> Vec<UnitId> {
        tree.files()
            .filter(|&id| tree.file(id).is_some_and(|file| file.control.checked))
            .collect()
    }

    /// Checked controls in rendered order.
    pub fn capture(tree: &FileTree) -> Vec<SelectionEntry> {
        Self::checked_units(tree)
            .into_iter()
            .filter_map(|id| tree.file(id))
            .map(|file| SelectionEntry {
                path: file.control.value.clone(),
                filename: file.name.clone(),
            })
            .collect()
    }

    /// Re-check captured entries. Entries whose file is gone are dropped.
    pub fn restore(tree: &mut FileTree, entries: &[SelectionEntry]) -> usize {
        let mut restored = 0;
        for entry in entries {
            if Self::set_checked_by_value(tree, &entry.path, true) {
                restored += 1;
            } else {
                debug!(path = %entry.path, "selected file no longer present");
            }
        }
        restored
    }

    pub(crate) fn set_checked_by_value(tree: &mut FileTree, path: &str, checked: bool) -> bool {
        match tree.find_control_by_value(path).and_then(|id| tree.file_mut(id)) {
            Some(file) => {
                file.control.checked = checked;
                true
            }
            None => false,
        }
    }

    /// Rebuild the summary from the controls and publish the new count.
    pub fn recompute(&mut self, tree: &FileTree) -> &SelectionSummary {
        let items: Vec<SummaryItem> = Self::checked_units(tree)
            .into_iter()
            .filter_map(|id| tree.file(id))
            .map(|file| SummaryItem {
                name: file.name.clone(),
                path: file.control.value.clone(),
            })
            .collect();
        let count = items.len();
        self.summary = if items.is_empty() {
            SelectionSummary::Empty {
                placeholder: EMPTY_SELECTION_PLACEHOLDER,
            }
        } else {
            SelectionSummary::Listed(items)
        };
        self.count_tx.send_replace(count);
        &self.summary
    }

    /// Interactive checkbox toggle on a rendered file.
    pub fn toggle(&mut self, tree: &mut FileTree, unit: UnitId) -> bool {
        let Some(file) = tree.file_mut(unit) else {
            return false;
        };
        file.control.checked = !file.control.checked;
        self.recompute(tree);
        true
    }

    /// Uncheck the control for `path`. Nothing happens when it is not rendered.
    pub fn remove(&mut self, tree: &mut FileTree, path: &str) -> bool {
        if !Self::set_checked_by_value(tree, path, false) {
            return false;
        }
        self.recompute(tree);
        true
    }

    pub fn clear_all(&mut self, tree: &mut FileTree) {
        Self::uncheck_all(tree);
        self.recompute(tree);
    }

    pub(crate) fn uncheck_all(tree: &mut FileTree) {
        for id in Self::checked_units(tree) {
            if let Some(file) = tree.file_mut(id) {
                file.control.checked = false;
            }
        }
    }

    /// Explicit "add" affordance: the control is looked up by the id derived
    /// from its path, and its value must still be that path. Returns the file
    /// name when something was checked.
    pub fn add_file(&mut self, tree: &mut FileTree, path: &str) -> Option<String> {
        let id = tree.find_control(&control_id_for(path), path)?;
        let file = tree.file_mut(id)?;
        file.control.checked = true;
        let name = file.name.clone();
        self.recompute(tree);
        Some(name)
    }
}

use super::dom::{Container, FileTree, UnitId};
use super::model::{FolderPath, TreeModel};
use std::collections::BTreeSet;
use tracing::debug;

/// Folder paths that were open when captured. Consumed by one restore.
pub type ExpandedSet = BTreeSet<FolderPath>;

pub struct ExpansionTracker;

impl ExpansionTracker {
    /// Every folder whose content panel is shown, keyed by its path.
    pub fn capture(tree: &FileTree) -> ExpandedSet {
        let model = TreeModel::new(tree);
        tree.folders()
            .filter(|&id| tree.folder(id).is_some_and(|folder| folder.shown))
            .map(|id| model.folder_path(id))
            .filter(|path| !path.is_empty())
            .collect()
    }

    /// Re-open captured folders in a freshly rendered tree.
    ///
    /// The first pass opens every root-level folder named like a path's first
    /// segment, so top-level context comes back even when deeper matching
    /// fails. The second pass walks each path level by level and stops at the
    /// first segment that no longer exists.
    pub fn restore(tree: &mut FileTree, expanded: &ExpandedSet) {
        for path in expanded {
            let Some(top) = path.first() else { continue };
            let matches = TreeModel::new(tree).child_folders_named(Container::Root, top);
            for id in matches {
                Self::open(tree, id);
            }
        }

        for path in expanded {
            let mut scope = Container::Root;
            for segment in path.segments() {
                let found = TreeModel::new(tree)
                    .child_folders_named(scope, segment)
                    .first()
                    .copied();
                match found {
                    Some(id) => {
                        Self::open(tree, id);
                        scope = Container::Folder(id);
                    }
                    None => {
                        debug!(path = %path, missing = %segment, "expanded folder no longer present");
                        break;
                    }
                }
            }
        }
    }

    /// Show a folder's content. Opening an open folder changes nothing.
    pub fn open(tree: &mut FileTree, folder: UnitId) -> bool {
        tree.set_shown(folder, true)
    }

    /// Flip a folder between shown and hidden.
    pub fn toggle(tree: &mut FileTree, folder: UnitId) -> bool {
        match tree.folder(folder).map(|unit| unit.shown) {
            Some(shown) => tree.set_shown(folder, !shown),
            None => false,
        }
    }

    pub fn expand_all(tree: &mut FileTree) {
        for id in tree.folders().collect::<Vec<_>>() {
            tree.set_shown(id, true);
        }
    }

    pub fn collapse_all(tree: &mut FileTree) {
        for id in tree.folders().collect::<Vec<_>>() {
            tree.set_shown(id, false);
        }
    }
}

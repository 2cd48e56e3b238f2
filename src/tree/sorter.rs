use super::dom::{Container, FileTree, UnitId, UnitKind};

/// Sort priority of a sibling unit: folders, then files, then anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Folder = 0,
    File = 1,
    Unknown = 2,
}

pub struct TreeSorter;

impl TreeSorter {
    /// Put every sibling group into canonical order: folders before files,
    /// both case-insensitively alphabetical, at every nesting level.
    pub fn sort(tree: &mut FileTree) {
        Self::sort_container(tree, Container::Root);
    }

    pub fn sort_container(tree: &mut FileTree, container: Container) {
        let mut order: Vec<UnitId> = tree.children(container).to_vec();
        if order.is_empty() {
            return;
        }
        // Stable: equal keys keep their rendered order.
        order.sort_by_cached_key(|&id| {
            (
                Self::rank(tree, id),
                tree.display_name(id).trim().to_lowercase(),
            )
        });
        tree.set_children(container, order.clone());

        for id in order {
            let has_content = tree.folder(id).is_some_and(|folder| !folder.content.is_empty());
            if has_content {
                Self::sort_container(tree, Container::Folder(id));
            }
        }
    }

    fn rank(tree: &FileTree, id: UnitId) -> Rank {
        match tree.unit(id).map(|unit| &unit.kind) {
            Some(UnitKind::Folder(_)) => Rank::Folder,
            Some(UnitKind::File(_)) => Rank::File,
            _ => Rank::Unknown,
        }
    }
}

//! The rendered tree: an arena of role-tagged units the front end draws from.
//!
//! Content is replaced wholesale on every refresh, so `UnitId`s are only
//! meaningful until the next `install` or `show_message`.

use super::markup::{MarkupNode, Role};

pub type UnitId = usize;

/// Directional indicator drawn next to a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chevron {
    Right,
    Down,
}

#[derive(Debug, Clone)]
pub struct FolderUnit {
    pub name: String,
    pub shown: bool,
    pub chevron: Chevron,
    pub content: Vec<UnitId>,
}

/// The checkbox attached to every rendered file.
#[derive(Debug, Clone)]
pub struct SelectionControl {
    pub id: String,
    pub value: String,
    pub checked: bool,
}

#[derive(Debug, Clone)]
pub struct FileUnit {
    pub name: String,
    pub control: SelectionControl,
}

#[derive(Debug, Clone)]
pub enum UnitKind {
    Folder(FolderUnit),
    File(FileUnit),
    Unknown { text: String },
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub kind: UnitKind,
    pub parent: Option<UnitId>,
}

/// A group of sibling units: either the tree root or a folder's content panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Root,
    Folder(UnitId),
}

/// Deterministic control id for a file path (`a/b.py` -> `file_a_b_py`).
pub fn control_id_for(path: &str) -> String {
    format!("file_{}", path.replace(['/', '.'], "_"))
}

#[derive(Debug, Default)]
pub struct FileTree {
    units: Vec<Unit>,
    root: Vec<UnitId>,
    message: Option<String>,
    loading: bool,
    dimmed: bool,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_markup(nodes: &[MarkupNode]) -> Self {
        let mut tree = FileTree::new();
        tree.install(nodes);
        tree
    }

    /// Replace the entire content with freshly rendered markup. Every folder
    /// starts collapsed and every control unchecked.
    pub fn install(&mut self, nodes: &[MarkupNode]) {
        self.units.clear();
        self.message = None;
        let root: Vec<UnitId> = nodes
            .iter()
            .map(|node| self.push_node(node, None))
            .collect();
        self.root = root;
    }

    fn push_node(&mut self, node: &MarkupNode, parent: Option<UnitId>) -> UnitId {
        let id = self.units.len();
        let kind = match (node.role, node.path.as_deref()) {
            (Role::Folder, _) => UnitKind::Folder(FolderUnit {
                name: node.name.clone(),
                shown: false,
                chevron: Chevron::Right,
                content: Vec::new(),
            }),
            (Role::File, Some(path)) => UnitKind::File(FileUnit {
                name: node.name.clone(),
                control: SelectionControl {
                    id: control_id_for(path),
                    value: path.to_string(),
                    checked: false,
                },
            }),
            // A file without a path has no usable control.
            _ => UnitKind::Unknown {
                text: node.text.clone().unwrap_or_else(|| node.name.clone()),
            },
        };
        self.units.push(Unit { kind, parent });

        if node.role == Role::Folder {
            let content: Vec<UnitId> = node
                .children
                .iter()
                .map(|child| self.push_node(child, Some(id)))
                .collect();
            if let UnitKind::Folder(folder) = &mut self.units[id].kind {
                folder.content = content;
            }
        }
        id
    }

    /// Drop a single synthetic root folder so only its entries are shown.
    pub fn unwrap_root(&mut self) -> bool {
        let &[only] = self.root.as_slice() else {
            return false;
        };
        let content = match &self.units[only].kind {
            UnitKind::Folder(folder) => folder.content.clone(),
            _ => return false,
        };
        for &child in &content {
            self.units[child].parent = None;
        }
        self.root = content;
        true
    }

    /// Discard the tree and show an inline message in its place.
    pub fn show_message(&mut self, text: impl Into<String>) {
        self.units.clear();
        self.root.clear();
        self.message = Some(text.into());
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.dimmed = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_dimmed(&self) -> bool {
        self.dimmed
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn parent(&self, id: UnitId) -> Option<UnitId> {
        self.units.get(id).and_then(|unit| unit.parent)
    }

    pub fn folder(&self, id: UnitId) -> Option<&FolderUnit> {
        match self.units.get(id).map(|unit| &unit.kind) {
            Some(UnitKind::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    pub fn file(&self, id: UnitId) -> Option<&FileUnit> {
        match self.units.get(id).map(|unit| &unit.kind) {
            Some(UnitKind::File(file)) => Some(file),
            _ => None,
        }
    }

    pub(crate) fn file_mut(&mut self, id: UnitId) -> Option<&mut FileUnit> {
        match self.units.get_mut(id).map(|unit| &mut unit.kind) {
            Some(UnitKind::File(file)) => Some(file),
            _ => None,
        }
    }

    pub fn children(&self, container: Container) -> &[UnitId] {
        match container {
            Container::Root => &self.root,
            Container::Folder(id) => self
                .folder(id)
                .map_or(&[][..], |folder| folder.content.as_slice()),
        }
    }

    pub(crate) fn set_children(&mut self, container: Container, order: Vec<UnitId>) {
        match container {
            Container::Root => self.root = order,
            Container::Folder(id) => {
                if let Some(Unit {
                    kind: UnitKind::Folder(folder),
                    ..
                }) = self.units.get_mut(id)
                {
                    folder.content = order;
                }
            }
        }
    }

    /// Name used for ordering and matching: folder/file name or the unknown
    /// unit's fallback text.
    pub fn display_name(&self, id: UnitId) -> &str {
        match self.units.get(id).map(|unit| &unit.kind) {
            Some(UnitKind::Folder(folder)) => &folder.name,
            Some(UnitKind::File(file)) => &file.name,
            Some(UnitKind::Unknown { text }) => text,
            None => "",
        }
    }

    /// Open or close a folder's content panel. Returns `false` for non-folders.
    pub fn set_shown(&mut self, id: UnitId, shown: bool) -> bool {
        match self.units.get_mut(id).map(|unit| &mut unit.kind) {
            Some(UnitKind::Folder(folder)) => {
                folder.shown = shown;
                folder.chevron = if shown { Chevron::Down } else { Chevron::Right };
                true
            }
            _ => false,
        }
    }

    /// All units in rendered (document) order.
    pub fn walk(&self) -> Vec<UnitId> {
        let mut order = Vec::with_capacity(self.units.len());
        let mut stack: Vec<UnitId> = self.root.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(folder) = self.folder(id) {
                stack.extend(folder.content.iter().rev().copied());
            }
        }
        order
    }

    pub fn folders(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.walk()
            .into_iter()
            .filter(|&id| self.folder(id).is_some())
    }

    pub fn files(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.walk().into_iter().filter(|&id| self.file(id).is_some())
    }

    pub fn find_control_by_value(&self, value: &str) -> Option<UnitId> {
        self.files()
            .find(|&id| self.file(id).is_some_and(|file| file.control.value == value))
    }

    /// Ids are derived from paths and can collide (`a/b.py`, `a_b.py`), so
    /// the value has to match as well.
    pub fn find_control(&self, control_id: &str, value: &str) -> Option<UnitId> {
        self.files().find(|&id| {
            self.file(id)
                .is_some_and(|file| file.control.id == control_id && file.control.value == value)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// root -> project -> { src -> { app.py, lib/ -> util.py }, README.md, notes.txt }
    pub(crate) fn sample_markup() -> Vec<MarkupNode> {
        vec![MarkupNode::folder(
            "project",
            vec![
                MarkupNode::file("README.md", "README.md"),
                MarkupNode::folder(
                    "src",
                    vec![
                        MarkupNode::file("app.py", "src/app.py"),
                        MarkupNode::folder("lib", vec![MarkupNode::file("util.py", "src/lib/util.py")]),
                    ],
                ),
                MarkupNode::file("notes.txt", "notes.txt"),
            ],
        )]
    }

    #[test]
    fn install_starts_collapsed_and_unchecked() {
        let tree = FileTree::from_markup(&sample_markup());
        assert!(tree.folders().all(|id| !tree.folder(id).unwrap().shown));
        assert!(tree.files().all(|id| !tree.file(id).unwrap().control.checked));
        assert_eq!(tree.files().count(), 4);
    }

    #[test]
    fn unwrap_root_promotes_wrapper_content() {
        let mut tree = FileTree::from_markup(&sample_markup());
        assert!(tree.unwrap_root());
        let names: Vec<&str> = tree
            .children(Container::Root)
            .iter()
            .map(|&id| tree.display_name(id))
            .collect();
        assert_eq!(names, vec!["README.md", "src", "notes.txt"]);
        let top = tree.children(Container::Root)[0];
        assert_eq!(tree.parent(top), None);
    }

    #[test]
    fn unwrap_root_leaves_multiple_roots_alone() {
        let mut tree = FileTree::from_markup(&[
            MarkupNode::folder("a", vec![]),
            MarkupNode::file("b.txt", "b.txt"),
        ]);
        assert!(!tree.unwrap_root());
        assert_eq!(tree.children(Container::Root).len(), 2);
    }

    #[test]
    fn control_ids_replace_separators_and_dots() {
        assert_eq!(control_id_for("a/b.py"), "file_a_b_py");
        let tree = FileTree::from_markup(&sample_markup());
        let id = tree.find_control("file_src_lib_util_py", "src/lib/util.py").unwrap();
        assert_eq!(tree.file(id).unwrap().control.value, "src/lib/util.py");
    }

    #[test]
    fn show_message_discards_units() {
        let mut tree = FileTree::from_markup(&sample_markup());
        tree.show_message("Empty response received.");
        assert!(tree.children(Container::Root).is_empty());
        assert_eq!(tree.walk().len(), 0);
        assert_eq!(tree.message(), Some("Empty response received."));
    }

    #[test]
    fn file_without_path_is_unknown() {
        let mut node = MarkupNode::file("ghost", "x");
        node.path = None;
        let tree = FileTree::from_markup(&[node]);
        assert!(tree.file(0).is_none());
        assert_eq!(tree.display_name(0), "ghost");
    }
}

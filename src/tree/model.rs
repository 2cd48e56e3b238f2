use super::dom::{Container, FileTree, UnitId, UnitKind};
use std::fmt;

pub const PATH_SEPARATOR: &str = "/";

/// Folder names from the tree root down to a folder. Folders have no durable
/// identity across a re-render, so this is the key expansion state is stored
/// under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FolderPath(Vec<String>);

impl FolderPath {
    /// Split a joined path, ignoring empty segments.
    #[cfg(test)]
    pub fn parse(joined: &str) -> Self {
        FolderPath(
            joined
                .split(PATH_SEPARATOR)
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(PATH_SEPARATOR))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    File,
}

/// Structural view of one rendered folder or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub name: String,
    pub children: Vec<TreeNode>,
    pub identifier: Option<String>,
}

/// Read-only traversal over a rendered tree.
pub struct TreeModel<'a> {
    tree: &'a FileTree,
}

impl<'a> TreeModel<'a> {
    pub fn new(tree: &'a FileTree) -> Self {
        TreeModel { tree }
    }

    /// Walk parent folders up to the root, collecting names. Levels with a
    /// blank name are skipped rather than failing the whole path.
    pub fn folder_path(&self, folder: UnitId) -> FolderPath {
        let mut segments = Vec::new();
        let mut current = Some(folder);
        while let Some(id) = current {
            if let Some(unit) = self.tree.folder(id) {
                let name = unit.name.trim();
                if !name.is_empty() {
                    segments.push(name.to_string());
                }
            }
            current = self.tree.parent(id);
        }
        segments.reverse();
        FolderPath(segments)
    }

    /// Immediate folder children of a container whose name matches.
    pub fn child_folders_named(&self, container: Container, name: &str) -> Vec<UnitId> {
        self.tree
            .children(container)
            .iter()
            .copied()
            .filter(|&id| {
                self.tree
                    .folder(id)
                    .is_some_and(|folder| folder.name.trim() == name)
            })
            .collect()
    }

    /// The whole rendered tree as plain nodes. Unknown units are omitted.
    pub fn nodes(&self) -> Vec<TreeNode> {
        self.collect(self.tree.children(Container::Root))
    }

    fn collect(&self, ids: &[UnitId]) -> Vec<TreeNode> {
        ids.iter()
            .filter_map(|&id| match &self.tree.unit(id)?.kind {
                UnitKind::Folder(folder) => Some(TreeNode {
                    kind: NodeKind::Folder,
                    name: folder.name.clone(),
                    children: self.collect(&folder.content),
                    identifier: None,
                }),
                UnitKind::File(file) => Some(TreeNode {
                    kind: NodeKind::File,
                    name: file.name.clone(),
                    children: Vec::new(),
                    identifier: Some(file.control.value.clone()),
                }),
                UnitKind::Unknown { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::dom::tests::sample_markup;
    use crate::tree::markup::MarkupNode;

    fn folder_named(tree: &FileTree, name: &str) -> UnitId {
        tree.folders()
            .find(|&id| tree.folder(id).unwrap().name == name)
            .unwrap()
    }

    #[test]
    fn folder_path_collects_ancestors() {
        let mut tree = FileTree::from_markup(&sample_markup());
        tree.unwrap_root();
        let lib = folder_named(&tree, "lib");
        assert_eq!(TreeModel::new(&tree).folder_path(lib).to_string(), "src/lib");
    }

    #[test]
    fn root_level_folder_path_is_its_own_name() {
        let mut tree = FileTree::from_markup(&sample_markup());
        tree.unwrap_root();
        let src = folder_named(&tree, "src");
        assert_eq!(TreeModel::new(&tree).folder_path(src).to_string(), "src");
    }

    #[test]
    fn blank_ancestor_names_are_skipped() {
        let tree = FileTree::from_markup(&[MarkupNode::folder(
            " ",
            vec![MarkupNode::folder("inner", vec![])],
        )]);
        let inner = folder_named(&tree, "inner");
        assert_eq!(
            TreeModel::new(&tree).folder_path(inner),
            FolderPath::parse("inner")
        );
    }

    #[test]
    fn parse_drops_empty_segments() {
        assert_eq!(FolderPath::parse("/src//lib/").segments(), ["src", "lib"]);
        assert!(FolderPath::parse("").is_empty());
    }

    #[test]
    fn nodes_mirror_rendered_structure() {
        let mut tree = FileTree::from_markup(&sample_markup());
        tree.unwrap_root();
        let nodes = TreeModel::new(&tree).nodes();
        assert_eq!(nodes.len(), 3);
        let src = nodes.iter().find(|n| n.name == "src").unwrap();
        assert_eq!(src.kind, NodeKind::Folder);
        assert_eq!(src.children[0].identifier.as_deref(), Some("src/app.py"));
    }
}

use crate::tree::{Chevron, Container, FileTree, UnitId, UnitKind};

/// One visible line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub unit: UnitId,
    pub label: String,
}

/// Build tree-style labels for every visible unit, in document order.
///
/// Content of hidden folders is skipped entirely. Folders show their chevron,
/// files their checkbox state.
pub fn build_rows(tree: &FileTree) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    // ancestors_last[d] is true when the ancestor at depth d is the last of
    // its siblings, i.e. no "│" guide is drawn below it.
    let mut ancestors_last: Vec<bool> = Vec::new();
    push_rows(tree, Container::Root, &mut ancestors_last, &mut rows);
    rows
}

fn push_rows(
    tree: &FileTree,
    container: Container,
    ancestors_last: &mut Vec<bool>,
    rows: &mut Vec<TreeRow>,
) {
    let children = tree.children(container);
    for (idx, &unit) in children.iter().enumerate() {
        let is_last = idx + 1 == children.len();

        let mut prefix = String::new();
        for &last in ancestors_last.iter() {
            prefix.push_str(if last { "   " } else { "│  " });
        }
        prefix.push_str(if is_last { "└─ " } else { "├─ " });

        rows.push(TreeRow {
            unit,
            label: format!("{}{}", prefix, decorate(tree, unit)),
        });

        if let Some(folder) = tree.folder(unit).filter(|folder| folder.shown) {
            if !folder.content.is_empty() {
                ancestors_last.push(is_last);
                push_rows(tree, Container::Folder(unit), ancestors_last, rows);
                ancestors_last.pop();
            }
        }
    }
}

fn decorate(tree: &FileTree, unit: UnitId) -> String {
    match tree.unit(unit).map(|u| &u.kind) {
        Some(UnitKind::Folder(folder)) => {
            let chevron = match folder.chevron {
                Chevron::Right => "▸",
                Chevron::Down => "▾",
            };
            format!("{} {}/", chevron, folder.name)
        }
        Some(UnitKind::File(file)) => {
            let mark = if file.control.checked { "[x]" } else { "[ ]" };
            format!("{} {}", mark, file.name)
        }
        Some(UnitKind::Unknown { text }) => text.clone(),
        None => String::new(),
    }
}

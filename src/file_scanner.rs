use crate::tree::MarkupNode;
use anyhow::Result;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn scan_files(root: &Path, include_ignored: bool) -> Result<Vec<(PathBuf, bool)>> {
    let mut collected_paths: Vec<(PathBuf, bool)> = Vec::new();
    let mut walker = WalkBuilder::new(root);

    if include_ignored {
        walker.git_ignore(false).ignore(false);
    }

    for result in walker.build() {
        let dirent = match result {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "skipping entry during scan");
                continue;
            }
        };

        let path = dirent.into_path();
        // The root becomes the synthetic wrapper, not an entry.
        if path == root {
            continue;
        }
        let is_dir = path.is_dir();
        collected_paths.push((path, is_dir));
    }

    collected_paths.sort_by(|(a, _), (b, _)| a.cmp(b));
    collected_paths.dedup_by(|(a, _), (b, _)| a == b);

    Ok(collected_paths)
}

#[derive(Default)]
struct DirBuilder {
    dirs: BTreeMap<String, DirBuilder>,
    files: Vec<(String, String)>,
}

impl DirBuilder {
    fn insert(&mut self, components: &[String], rel_path: &str, is_dir: bool) {
        match components {
            [] => {}
            [last] if !is_dir => self.files.push((last.clone(), rel_path.to_string())),
            [first, rest @ ..] => self
                .dirs
                .entry(first.clone())
                .or_default()
                .insert(rest, rel_path, is_dir),
        }
    }

    fn into_children(self) -> Vec<MarkupNode> {
        let mut children: Vec<MarkupNode> = self
            .dirs
            .into_iter()
            .map(|(name, dir)| MarkupNode::folder(name, dir.into_children()))
            .collect();
        children.extend(
            self.files
                .into_iter()
                .map(|(name, path)| MarkupNode::file(name, path)),
        );
        children
    }
}

/// Render scan results as markup wrapped in a single root folder named after
/// the scanned directory. File paths are root-relative with `/` separators.
pub fn build_markup(root: &Path, entries: &[(PathBuf, bool)]) -> MarkupNode {
    let mut builder = DirBuilder::default();
    for (path, is_dir) in entries {
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let components: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let rel_path = components.join("/");
        builder.insert(&components, &rel_path, *is_dir);
    }

    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    MarkupNode::folder(root_name, builder.into_children())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::markup::Role;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/lib")).unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();
        fs::write(dir.path().join("src/app.py"), "print()").unwrap();
        fs::write(dir.path().join("src/lib/util.py"), "x = 1").unwrap();
        dir
    }

    #[test]
    fn markup_has_synthetic_root_and_relative_paths() {
        let dir = setup_test_dir();
        let entries = scan_files(dir.path(), false).unwrap();
        let root = build_markup(dir.path(), &entries);

        assert_eq!(root.role, Role::Folder);
        let names: Vec<&str> = root.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["empty", "src", "README.md"]);

        let src = &root.children[1];
        let lib = &src.children[0];
        assert_eq!(lib.name, "lib");
        assert_eq!(lib.children[0].path.as_deref(), Some("src/lib/util.py"));
        assert_eq!(src.children[1].path.as_deref(), Some("src/app.py"));
    }

    #[test]
    fn gitignored_files_are_skipped_unless_requested() {
        let dir = setup_test_dir();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "secret.txt\n").unwrap();
        fs::write(dir.path().join("secret.txt"), "x").unwrap();

        let kept = scan_files(dir.path(), false).unwrap();
        assert!(!kept.iter().any(|(p, _)| p.ends_with("secret.txt")));

        let all = scan_files(dir.path(), true).unwrap();
        assert!(all.iter().any(|(p, _)| p.ends_with("secret.txt")));
    }
}

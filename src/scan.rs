//! Repository discovery: walk the workspace root and collect the relative
//! path of every directory directly containing a `.git` folder.
//!
//! Hidden directories and dependency-manager caches are skipped, and the
//! walk never descends into a repository (nested checkouts are the parent's
//! concern). The launcher trusts the resulting list verbatim.

use std::fs;
use std::path::{Path, PathBuf};

/// Directory names that never contain repositories worth listing.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "vendor",
    "dist",
    "build",
    "out",
    ".venv",
    "__pycache__",
];

/// Scan the workspace root. Returned paths are relative to `root`, sorted.
pub fn scan_repositories(root: &Path) -> Vec<String> {
    let mut found = Vec::new();
    walk(root, root, &mut found);
    found.sort();
    found
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<String>) {
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };
    let mut subdirs: Vec<PathBuf> = Vec::new();
    for entry in read.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || SKIP_DIRS.contains(&name) {
            continue;
        }
        subdirs.push(path);
    }

    for sub in subdirs {
        if sub.join(".git").is_dir() {
            if let Ok(rel) = sub.strip_prefix(root) {
                found.push(rel.to_string_lossy().replace('\\', "/"));
            }
        } else {
            walk(root, &sub, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkrepo(root: &Path, rel: &str) {
        let dir = root.join(rel).join(".git");
        std::fs::create_dir_all(dir).unwrap();
    }

    #[test]
    fn finds_nested_repositories_by_relative_path() {
        let tmp = tempfile::tempdir().unwrap();
        mkrepo(tmp.path(), "app");
        mkrepo(tmp.path(), "org/site");
        std::fs::create_dir_all(tmp.path().join("empty/dir")).unwrap();

        let repos = scan_repositories(tmp.path());
        assert_eq!(repos, vec!["app", "org/site"]);
    }

    #[test]
    fn skips_hidden_and_dependency_directories() {
        let tmp = tempfile::tempdir().unwrap();
        mkrepo(tmp.path(), ".config/secret");
        mkrepo(tmp.path(), "node_modules/dep");
        mkrepo(tmp.path(), "app");

        let repos = scan_repositories(tmp.path());
        assert_eq!(repos, vec!["app"]);
    }

    #[test]
    fn does_not_descend_into_repositories() {
        let tmp = tempfile::tempdir().unwrap();
        mkrepo(tmp.path(), "outer");
        mkrepo(tmp.path(), "outer/inner");

        let repos = scan_repositories(tmp.path());
        assert_eq!(repos, vec!["outer"]);
    }
}

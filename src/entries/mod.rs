//! The curated entry tree: repository leaves and group containers.
//!
//! Entries are owned recursive values. Every structural mutation works by
//! detaching a subtree and re-attaching it somewhere else, so no two places
//! in the tree can ever alias the same node. Positions are addressed by
//! index paths (`&[usize]`) as produced by [`flatten`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::git::DiffTotals;

/// Whether an entry is a launchable repository or a grouping container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Repository,
    Group,
}

/// A node in the curated launch tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub kind: EntryKind,
    /// Workspace-relative path; present for repository entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_path: Option<String>,
    pub display_name: String,
    /// Preferred IDE name from the config's ide registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_ide: Option<String>,
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
    #[serde(default)]
    pub children: Vec<Entry>,
}

fn default_expanded() -> bool {
    true
}

impl Entry {
    /// A repository leaf. The display name defaults to the last path segment.
    pub fn repository(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self {
            kind: EntryKind::Repository,
            repository_path: Some(path.to_string()),
            display_name: name,
            preferred_ide: None,
            is_expanded: true,
            children: Vec::new(),
        }
    }

    /// An empty group container.
    pub fn group(name: &str) -> Self {
        Self {
            kind: EntryKind::Group,
            repository_path: None,
            display_name: name.to_string(),
            preferred_ide: None,
            is_expanded: true,
            children: Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == EntryKind::Group
    }
}

/// One visible row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    /// Index path from the root to this entry.
    pub path: Vec<usize>,
    pub depth: usize,
}

/// Flatten the tree depth-first, pre-order. Children appear immediately
/// after their parent and only when the parent is expanded, so collapsing a
/// node removes its whole subtree from the visible index space. Display and
/// edit traversal both use this.
pub fn flatten(tree: &[Entry]) -> Vec<FlatRow> {
    let mut rows = Vec::new();
    let mut stack = Vec::new();
    flatten_into(tree, &mut stack, 0, &mut rows);
    rows
}

fn flatten_into(entries: &[Entry], prefix: &mut Vec<usize>, depth: usize, rows: &mut Vec<FlatRow>) {
    for (i, entry) in entries.iter().enumerate() {
        prefix.push(i);
        rows.push(FlatRow {
            path: prefix.clone(),
            depth,
        });
        if entry.is_expanded && !entry.children.is_empty() {
            flatten_into(&entry.children, prefix, depth + 1, rows);
        }
        prefix.pop();
    }
}

/// Fill in structure older config files may lack. Serde already defaults
/// missing `children` to empty; this exists so a loaded tree can be brought
/// to canonical form explicitly, and it is idempotent.
pub fn normalize(tree: &mut [Entry]) {
    for entry in tree.iter_mut() {
        if entry.kind == EntryKind::Repository {
            entry.children.clear();
        }
        normalize(&mut entry.children);
    }
}

pub fn entry_at<'a>(tree: &'a [Entry], path: &[usize]) -> Option<&'a Entry> {
    let (&first, rest) = path.split_first()?;
    let entry = tree.get(first)?;
    if rest.is_empty() {
        Some(entry)
    } else {
        entry_at(&entry.children, rest)
    }
}

pub fn entry_at_mut<'a>(tree: &'a mut [Entry], path: &[usize]) -> Option<&'a mut Entry> {
    let (&first, rest) = path.split_first()?;
    let entry = tree.get_mut(first)?;
    if rest.is_empty() {
        Some(entry)
    } else {
        entry_at_mut(&mut entry.children, rest)
    }
}

/// Direction for sibling swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDir {
    Up,
    Down,
}

/// Swap the entry with its immediate sibling. No-op at either end of the
/// sibling sequence; never changes depth. Returns the entry's new index path.
pub fn move_entry(tree: &mut Vec<Entry>, path: &[usize], dir: MoveDir) -> Vec<usize> {
    let Some((&idx, parent_path)) = path.split_last() else {
        return path.to_vec();
    };
    let siblings = match siblings_mut(tree, parent_path) {
        Some(s) => s,
        None => return path.to_vec(),
    };
    let new_idx = match dir {
        MoveDir::Up if idx > 0 => idx - 1,
        MoveDir::Down if idx + 1 < siblings.len() => idx + 1,
        _ => return path.to_vec(),
    };
    siblings.swap(idx, new_idx);
    let mut new_path = parent_path.to_vec();
    new_path.push(new_idx);
    new_path
}

fn siblings_mut<'a>(tree: &'a mut Vec<Entry>, parent_path: &[usize]) -> Option<&'a mut Vec<Entry>> {
    if parent_path.is_empty() {
        Some(tree)
    } else {
        entry_at_mut(tree, parent_path).map(|e| &mut e.children)
    }
}

/// Detach the entry (and its subtree) at the given index path.
pub fn remove_at(tree: &mut Vec<Entry>, path: &[usize]) -> Option<Entry> {
    let (&idx, parent_path) = path.split_last()?;
    let siblings = siblings_mut(tree, parent_path)?;
    if idx < siblings.len() {
        Some(siblings.remove(idx))
    } else {
        None
    }
}

/// Detach the entry at `path` and re-attach it as the last child of the
/// entry at `target` (or at root when `target` is `None`).
///
/// Callers must never nominate the entry itself or one of its descendants as
/// a target; the model performs no cycle check because such targets are
/// never offered.
pub fn nest(tree: &mut Vec<Entry>, path: &[usize], target: Option<&[usize]>) -> bool {
    let Some(entry) = remove_at(tree, path) else {
        return false;
    };
    match target {
        None => {
            tree.push(entry);
            true
        }
        Some(target_path) => {
            // Removing the entry shifted sibling indices at one level of the
            // target path; re-resolve it.
            let adjusted = adjust_path_after_removal(target_path, path);
            match entry_at_mut(tree, &adjusted) {
                Some(parent) => {
                    parent.children.push(entry);
                    true
                }
                None => {
                    // Target vanished (caller bug); restore at root rather
                    // than drop the subtree.
                    tree.push(entry);
                    false
                }
            }
        }
    }
}

/// After removing the node at `removed`, shift the one path component of
/// `path` that shared the removed node's parent and sat after it.
fn adjust_path_after_removal(path: &[usize], removed: &[usize]) -> Vec<usize> {
    let mut adjusted = path.to_vec();
    let (&removed_idx, removed_parent) = match removed.split_last() {
        Some(split) => split,
        None => return adjusted,
    };
    let level = removed_parent.len();
    if path.len() > level && path[..level] == *removed_parent && path[level] > removed_idx {
        adjusted[level] -= 1;
    }
    adjusted
}

/// Enumerate valid nest targets for the entry at `path`: every group in the
/// tree except the entry itself and its descendants, plus root (`None`).
pub fn nest_targets(tree: &[Entry], path: &[usize]) -> Vec<Option<Vec<usize>>> {
    let mut targets: Vec<Option<Vec<usize>>> = vec![None];
    for row in flatten_all(tree) {
        let Some(entry) = entry_at(tree, &row) else {
            continue;
        };
        if !entry.is_group() {
            continue;
        }
        // Exclude self and descendants.
        if row.len() >= path.len() && row[..path.len()] == *path {
            continue;
        }
        targets.push(Some(row));
    }
    targets
}

/// Like [`flatten`] but ignoring expansion state; used for edit-time
/// searches that must see collapsed subtrees too.
fn flatten_all(tree: &[Entry]) -> Vec<Vec<usize>> {
    fn walk(entries: &[Entry], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        for (i, entry) in entries.iter().enumerate() {
            prefix.push(i);
            out.push(prefix.clone());
            walk(&entry.children, prefix, out);
            prefix.pop();
        }
    }
    let mut out = Vec::new();
    walk(tree, &mut Vec::new(), &mut out);
    out
}

/// First path segment of a repository entry's path, used for grouping.
pub fn first_segment(entry: &Entry) -> Option<&str> {
    entry
        .repository_path
        .as_deref()
        .and_then(|p| p.split('/').next())
        .filter(|s| !s.is_empty())
}

/// Indices of root-level entries whose first path segment equals `prefix`.
pub fn prefix_matches(tree: &[Entry], prefix: &str) -> Vec<usize> {
    tree.iter()
        .enumerate()
        .filter(|(_, e)| first_segment(e) == Some(prefix))
        .map(|(i, _)| i)
        .collect()
}

/// Wrap all root-level entries sharing `prefix` as their first path segment
/// in a new group inserted at the first match's position. Requires at least
/// two matches; otherwise the tree is left untouched and `false` returned.
/// Only root-level entries participate.
pub fn group_by_prefix(tree: &mut Vec<Entry>, prefix: &str) -> bool {
    let matches = prefix_matches(tree, prefix);
    if matches.len() < 2 {
        return false;
    }
    let insert_at = matches[0];
    let mut group = Entry::group(prefix);
    // Remove back-to-front so earlier indices stay valid.
    for &idx in matches.iter().rev() {
        group.children.insert(0, tree.remove(idx));
    }
    tree.insert(insert_at, group);
    true
}

/// Replace the group at `path` with its children, promoting them one level
/// in place. Only defined for entries that currently have children.
pub fn flatten_group(tree: &mut Vec<Entry>, path: &[usize]) -> bool {
    let has_children = entry_at(tree, path).is_some_and(|e| !e.children.is_empty());
    if !has_children {
        return false;
    }
    let Some((&idx, parent_path)) = path.split_last() else {
        return false;
    };
    let Some(siblings) = siblings_mut(tree, parent_path) else {
        return false;
    };
    let group = siblings.remove(idx);
    for (offset, child) in group.children.into_iter().enumerate() {
        siblings.insert(idx + offset, child);
    }
    true
}

/// Every repository path referenced somewhere in the tree.
pub fn claimed_paths(tree: &[Entry]) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(tree, &mut paths);
    paths
}

fn collect_paths(entries: &[Entry], out: &mut Vec<String>) {
    for entry in entries {
        if let Some(path) = &entry.repository_path {
            out.push(path.clone());
        }
        collect_paths(&entry.children, out);
    }
}

/// Prune every entry referencing the given repository path, wherever it sits.
/// Returns true if anything was removed.
pub fn remove_repository(tree: &mut Vec<Entry>, repo_path: &str) -> bool {
    let before = tree.len();
    tree.retain(|e| e.repository_path.as_deref() != Some(repo_path));
    let mut removed = tree.len() != before;
    for entry in tree.iter_mut() {
        removed |= remove_repository(&mut entry.children, repo_path);
    }
    removed
}

/// Synthetic cache key carrying a group's rolled-up diff stats.
pub fn group_stats_key(name: &str) -> String {
    format!("group:{name}")
}

/// For every group, sum descendant diff totals into `diffs` under the
/// group's synthetic key so collapsed groups can show rolled-up counts.
/// Groups whose descendants have no recorded changes get no entry at all.
pub fn aggregate_stats(tree: &[Entry], diffs: &mut HashMap<String, DiffTotals>) {
    for entry in tree {
        if entry.is_group() {
            aggregate_stats(&entry.children, diffs);
            let mut total = DiffTotals::default();
            let mut any = false;
            sum_descendants(&entry.children, diffs, &mut total, &mut any);
            if any {
                diffs.insert(group_stats_key(&entry.display_name), total);
            } else {
                diffs.remove(&group_stats_key(&entry.display_name));
            }
        }
    }
}

fn sum_descendants(
    entries: &[Entry],
    diffs: &HashMap<String, DiffTotals>,
    total: &mut DiffTotals,
    any: &mut bool,
) {
    for entry in entries {
        if let Some(stats) = entry
            .repository_path
            .as_deref()
            .and_then(|p| diffs.get(p))
        {
            total.files_changed += stats.files_changed;
            total.lines_added += stats.lines_added;
            total.lines_removed += stats.lines_removed;
            *any = true;
        }
        sum_descendants(&entry.children, diffs, total, any);
    }
}

//! Per-mode sub-state types.
//!
//! Each interaction mode is one variant of [`Mode`]; the dispatch in
//! `handlers` is keyed by the active variant, so every mode's transition
//! table can be exercised on its own.

use crate::git::{FileChange, PushSummary};

/// Items of the config menu, in display order.
pub const CONFIG_MENU_ITEMS: &[&str] = &[
    "Edit entries",
    "Manage repositories",
    "Scan repositories",
    "Create shortcut",
    "Edit startup modes",
];

/// The active interaction mode. Exactly one at a time.
pub enum Mode {
    /// Browse the tree and launch entries.
    Main,
    /// Pick a configuration action.
    ConfigMenu { selected: usize },
    /// Restructure the entry tree; commits or discards as a whole.
    EntriesEdit(EditorState),
    /// Toggle repositories between managed and unmanaged.
    Visibility(VisibilityState),
    /// Add/remove/rename/reorder assistant startup modes.
    StartupModes(StartupState),
    /// Cached branch / ahead-behind dashboard with fetch and batch push.
    Remote(RemoteState),
    /// Launch a managed repository that has no tree entry yet.
    OtherManaged { selected: usize },
    /// One-time desktop shortcut offer.
    FirstRun,
}

/// Entries-edit state; `modal` holds the single pending tree mutation.
pub struct EditorState {
    pub selected: usize,
    pub modal: Option<EditorModal>,
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            modal: None,
        }
    }
}

/// A modal inside entries-edit. Each applies or discards exactly one tree
/// mutation and then returns to the editor.
pub enum EditorModal {
    /// Pick an unclaimed managed repository to add at root.
    AddEntry {
        candidates: Vec<String>,
        selected: usize,
    },
    /// Pick a new parent for the entry at `source`. `None` = root. Invalid
    /// targets (the entry itself, its descendants) are never listed.
    Nest {
        source: Vec<usize>,
        targets: Vec<Option<Vec<usize>>>,
        selected: usize,
    },
    /// Confirm wrapping root-level matches in a new group.
    GroupConfirm { prefix: String, count: usize },
    /// Inline rename of the selected entry.
    Rename { buffer: String },
}

/// Repository-visibility manager: the selection walks the full discovered
/// list so unmanaged repositories can be re-managed.
pub struct VisibilityState {
    pub selected: usize,
}

/// Inline text edit inside the startup-modes editor.
pub enum StartupEdit {
    /// Renaming the selected mode.
    Rename { buffer: String },
    /// Typing the name of a mode to append.
    Add { buffer: String },
}

/// Startup-modes editor.
pub struct StartupState {
    pub selected: usize,
    pub editing: Option<StartupEdit>,
}

impl StartupState {
    pub fn new() -> Self {
        Self {
            selected: 0,
            editing: None,
        }
    }
}

/// Remote-status dashboard. `repos` is the managed list frozen on entry;
/// `files` is the changed-files panel for the selected row, if open.
pub struct RemoteState {
    pub selected: usize,
    pub repos: Vec<String>,
    pub files: Option<(String, Vec<FileChange>)>,
    /// Outcome of the last batch push, with every per-repository failure;
    /// shown as an overlay until dismissed.
    pub report: Option<PushSummary>,
}

impl RemoteState {
    pub fn new(repos: Vec<String>) -> Self {
        Self {
            selected: 0,
            repos,
            files: None,
            report: None,
        }
    }
}

//! Application state: the single owned value driving the whole interaction.
//!
//! One mode is active at a time; each mode owns its sub-state as a variant
//! of [`Mode`]. Edit-capable modes follow one discipline everywhere: Enter
//! commits by writing the in-memory config to disk, Escape discards by
//! re-reading persisted state over the in-memory copy. That makes every
//! editing session atomic from the user's point of view even though the
//! storage itself has no transactions.

mod state;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;

use crate::entries::{self, Entry, FlatRow};
use crate::git;
use crate::scan;
use crate::store::{RepoList, RunnerConfig, StatusCache, Store};
use crate::ui::status::StatusLine;

pub use state::{
    EditorModal, EditorState, Mode, RemoteState, StartupEdit, StartupState, VisibilityState,
    CONFIG_MENU_ITEMS,
};

/// Application state.
pub struct App {
    /// Workspace root all repository paths are relative to.
    pub root: PathBuf,
    /// Launch script used only for shortcut creation.
    pub launch_script: Option<PathBuf>,
    pub store: Store,
    pub repos: RepoList,
    pub config: RunnerConfig,
    pub cache: StatusCache,
    pub mode: Mode,
    /// Selected row in the main menu.
    pub selected: usize,
    /// Flattened tree rows; recomputed after every tree mutation.
    pub rows: Vec<FlatRow>,
    /// Index into `config.modes` (current run mode).
    pub mode_index: usize,
    /// Index into `config.claude_startup_modes`.
    pub startup_index: usize,
    pub status: StatusLine,
    /// Busy indicator drawn before a blocking operation runs.
    pub busy: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(root: &Path, state_dir: &Path, launch_script: Option<PathBuf>) -> Self {
        let store = Store::new(state_dir);
        let repos = store.load_repos();
        let config = store.load_config();
        let cache = store.load_cache();

        let mode = if config.shortcut_prompt_shown {
            Mode::Main
        } else {
            Mode::FirstRun
        };

        let mut app = Self {
            root: root.to_path_buf(),
            launch_script,
            store,
            repos,
            config,
            cache,
            mode,
            selected: 0,
            rows: Vec::new(),
            mode_index: 0,
            startup_index: 0,
            status: StatusLine::new(),
            busy: None,
            should_quit: false,
        };
        app.refresh_rows();
        app
    }

    /// Recompute the flattened display rows and clamp the selection.
    pub fn refresh_rows(&mut self) {
        self.rows = entries::flatten(&self.config.entries);
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
        if let Mode::EntriesEdit(editor) = &mut self.mode {
            if editor.selected >= self.rows.len() {
                editor.selected = self.rows.len().saturating_sub(1);
            }
        }
    }

    pub fn entry_at(&self, path: &[usize]) -> Option<&Entry> {
        entries::entry_at(&self.config.entries, path)
    }

    /// Managed repositories: everything discovered minus the unmanaged set.
    pub fn managed_paths(&self) -> Vec<String> {
        self.repos
            .paths()
            .into_iter()
            .filter(|p| !self.config.unmanaged_paths.contains(p))
            .collect()
    }

    /// Managed repositories with no entry anywhere in the tree. Computed on
    /// demand, never persisted.
    pub fn other_managed(&self) -> Vec<String> {
        let claimed = entries::claimed_paths(&self.config.entries);
        self.managed_paths()
            .into_iter()
            .filter(|p| !claimed.contains(p))
            .collect()
    }

    pub fn current_run_mode_name(&self) -> &str {
        self.config
            .modes
            .get(self.mode_index)
            .map_or("claude", String::as_str)
    }

    pub fn current_startup_mode(&self) -> &str {
        self.config
            .claude_startup_modes
            .get(self.startup_index)
            .map_or("No startup command", String::as_str)
    }

    pub fn cycle_run_mode(&mut self) {
        if !self.config.modes.is_empty() {
            self.mode_index = (self.mode_index + 1) % self.config.modes.len();
        }
    }

    pub fn cycle_startup_mode(&mut self) {
        if !self.config.claude_startup_modes.is_empty() {
            self.startup_index =
                (self.startup_index + 1) % self.config.claude_startup_modes.len();
        }
    }

    /// Commit: persist the in-memory config.
    pub fn commit_config(&mut self) {
        if let Err(e) = self.store.save_config(&self.config) {
            self.status.error(format!("Save failed: {e}"));
        } else {
            self.status.success("Saved");
        }
        self.clamp_startup_index();
    }

    /// Discard: overwrite in-memory state from disk.
    pub fn discard_config(&mut self) {
        self.config = self.store.load_config();
        self.clamp_startup_index();
        self.refresh_rows();
    }

    fn clamp_startup_index(&mut self) {
        if self.startup_index >= self.config.claude_startup_modes.len() {
            self.startup_index = 0;
        }
        if self.mode_index >= self.config.modes.len() {
            self.mode_index = 0;
        }
    }

    /// Blocking: recompute local diff stats for every managed repository,
    /// roll group aggregates, persist the cache.
    pub fn scan_diffs_now(&mut self) {
        let managed = self.managed_paths();
        git::scan_diffs(&self.root, &managed, &mut self.cache.diffs.data);
        entries::aggregate_stats(&self.config.entries, &mut self.cache.diffs.data);
        self.cache.diffs.last_scan = Some(Utc::now());
        match self.store.save_cache(&self.cache) {
            Ok(()) => self
                .status
                .success(format!("Scanned {} repositories", managed.len())),
            Err(e) => self.status.error(format!("Cache save failed: {e}")),
        }
    }

    /// Blocking: rediscover repositories under the workspace root and
    /// overwrite `repos.json` wholesale.
    pub fn scan_repos_now(&mut self) {
        let found = scan::scan_repositories(&self.root);
        let count = found.len();
        self.repos.replace(found);
        match self.store.save_repos(&self.repos) {
            Ok(()) => self
                .status
                .success(format!("Found {count} repositories")),
            Err(e) => self.status.error(format!("Repo list save failed: {e}")),
        }
    }

    /// Blocking: fetch every managed repository and refresh the
    /// network-derived cache fields.
    pub fn fetch_all_now(&mut self) {
        let managed = self.managed_paths();
        let mut fetched = 0usize;
        for path in &managed {
            let repo = self.root.join(path);
            if git::fetch(&repo) {
                fetched += 1;
            }
            self.cache
                .remote_status
                .data
                .insert(path.clone(), git::remote_status(&repo));
        }
        self.cache.remote_status.last_fetch = Some(Utc::now());
        match self.store.save_cache(&self.cache) {
            Ok(()) => self
                .status
                .success(format!("Fetched {fetched}/{} repositories", managed.len())),
            Err(e) => self.status.error(format!("Cache save failed: {e}")),
        }
    }

    /// Blocking: push every managed repository that is ahead of its
    /// upstream, then report the batch outcome. A failure never aborts the
    /// rest of the batch.
    pub fn push_ahead_now(&mut self) {
        let ahead: Vec<String> = self
            .managed_paths()
            .into_iter()
            .filter(|path| {
                self.cache
                    .remote_status
                    .data
                    .get(path)
                    .and_then(|s| s.upstream)
                    .is_some_and(|ab| ab.ahead > 0)
            })
            .collect();
        if ahead.is_empty() {
            self.status.info("Nothing ahead of upstream");
            return;
        }

        let root = self.root.clone();
        let summary = git::push_all(&ahead, |path| git::push(&root.join(path)));

        // Re-probe pushed repositories so the dashboard reflects reality.
        for path in &ahead {
            self.cache
                .remote_status
                .data
                .insert(path.clone(), git::remote_status(&root.join(path)));
        }
        let _ = self.store.save_cache(&self.cache);

        if summary.errors.is_empty() {
            self.status.success(summary.headline());
        } else {
            self.status.error(format!(
                "{} — {} failed",
                summary.headline(),
                summary.errors.len()
            ));
        }
        // Every per-repository failure message goes to the dashboard's
        // report overlay, not just the first.
        if !summary.errors.is_empty() {
            if let Mode::Remote(state) = &mut self.mode {
                state.report = Some(summary);
            }
        }
    }

    /// Record the first-run answer permanently, regardless of choice.
    pub fn record_shortcut_prompt(&mut self) -> Result<()> {
        self.config.shortcut_prompt_shown = true;
        self.store.save_config(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{AheadBehind, RemoteStatus};

    fn app_with(
        repos: &[&str],
        unmanaged: &[&str],
        entries: Vec<Entry>,
    ) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let store = Store::new(&state_dir);

        let mut list = RepoList::default();
        list.replace(repos.iter().map(|s| (*s).to_string()).collect());
        store.save_repos(&list).unwrap();

        let mut config = RunnerConfig::default();
        config.unmanaged_paths = unmanaged.iter().map(|s| (*s).to_string()).collect();
        config.entries = entries;
        config.shortcut_prompt_shown = true;
        store.save_config(&config).unwrap();

        let app = App::new(dir.path(), &state_dir, None);
        (app, dir)
    }

    #[test]
    fn other_managed_lists_unclaimed_managed_repositories() {
        let tree = vec![
            Entry::repository("A"),
            Entry::repository("B"),
            Entry::repository("org/c"),
        ];
        let (app, _dir) = app_with(&["A", "B", "org/c", "D"], &[], tree);
        assert_eq!(app.other_managed(), vec!["D"]);
    }

    #[test]
    fn unmanaged_paths_are_excluded_from_managed_and_other() {
        let (app, _dir) = app_with(&["A", "B"], &["B"], vec![Entry::repository("A")]);
        assert_eq!(app.managed_paths(), vec!["A"]);
        assert!(app.other_managed().is_empty());
    }

    #[test]
    fn first_run_prompt_shows_until_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let mut app = App::new(dir.path(), &state_dir, None);
        assert!(matches!(app.mode, Mode::FirstRun));

        app.record_shortcut_prompt().unwrap();
        let again = App::new(dir.path(), &state_dir, None);
        assert!(matches!(again.mode, Mode::Main));
    }

    #[test]
    fn discard_config_reloads_persisted_state() {
        let (mut app, _dir) = app_with(&["A"], &[], vec![Entry::repository("A")]);
        app.config.entries.clear();
        app.refresh_rows();
        assert!(app.rows.is_empty());

        app.discard_config();
        assert_eq!(app.rows.len(), 1);
    }

    #[test]
    fn commit_config_persists_edits() {
        let (mut app, _dir) = app_with(&["A", "B"], &[], vec![Entry::repository("A")]);
        app.config.entries.push(Entry::repository("B"));
        app.commit_config();

        let reloaded = app.store.load_config();
        assert_eq!(entries::claimed_paths(&reloaded.entries), vec!["A", "B"]);
    }

    #[test]
    fn push_ahead_only_considers_rows_ahead_of_upstream() {
        let (mut app, _dir) = app_with(&["A", "B"], &[], vec![]);
        app.cache.remote_status.data.insert(
            "A".to_string(),
            RemoteStatus {
                branch: Some("main".to_string()),
                upstream: Some(AheadBehind { ahead: 0, behind: 2 }),
                main: None,
            },
        );
        // B has no cached status at all.
        app.push_ahead_now();
        assert_eq!(
            app.status.current().map(|(m, _)| m.to_string()),
            Some("Nothing ahead of upstream".to_string())
        );
    }

    #[test]
    fn push_failures_reach_the_dashboard_report_in_full() {
        let (mut app, _dir) = app_with(&["a", "b"], &[], vec![]);
        for path in ["a", "b"] {
            app.cache.remote_status.data.insert(
                path.to_string(),
                RemoteStatus {
                    branch: Some("main".to_string()),
                    upstream: Some(AheadBehind { ahead: 1, behind: 0 }),
                    main: None,
                },
            );
        }
        app.mode = Mode::Remote(RemoteState::new(vec!["a".to_string(), "b".to_string()]));

        // Neither path exists on disk, so both pushes fail.
        app.push_ahead_now();

        let Mode::Remote(state) = &app.mode else {
            panic!("expected the dashboard to stay active");
        };
        let report = state.report.as_ref().expect("push report should be shown");
        assert_eq!(report.attempted, 2);
        assert_eq!(report.errors.len(), 2);
        let failed: Vec<&str> = report.errors.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(failed, vec!["a", "b"]);
        assert!(report.errors.iter().all(|(_, msg)| !msg.is_empty()));
    }

    #[test]
    fn cycle_run_mode_wraps_around() {
        let (mut app, _dir) = app_with(&[], &[], vec![]);
        let n = app.config.modes.len();
        for _ in 0..n {
            app.cycle_run_mode();
        }
        assert_eq!(app.mode_index, 0);
    }
}

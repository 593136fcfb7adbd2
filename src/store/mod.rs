//! Persistence of the three JSON documents under the state directory.
//!
//! Absent or malformed files are treated as first use and yield defaults;
//! nothing here errors on a missing file. Saves always create the state
//! directory first and write pretty-printed JSON so the files stay
//! hand-editable.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entries::{self, Entry};
use crate::git::{DiffTotals, RemoteStatus};

const REPOS_FILE: &str = "repos.json";
const CONFIG_FILE: &str = "runner-config.json";
const CACHE_FILE: &str = "cache.json";
/// Pre-combined-cache file; migrated into `cache.json` on first load.
const LEGACY_DIFF_CACHE_FILE: &str = "diff-cache.json";

/// One discovered git working copy. The repository list is ground truth,
/// refreshed wholesale on each scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRecord {
    pub path: String,
}

/// `repos.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoList {
    pub version: u32,
    pub updated_at: Option<DateTime<Utc>>,
    pub repositories: Vec<RepoRecord>,
}

impl Default for RepoList {
    fn default() -> Self {
        Self {
            version: 1,
            updated_at: None,
            repositories: Vec::new(),
        }
    }
}

impl RepoList {
    /// Replace the whole list with freshly scanned paths.
    pub fn replace(&mut self, paths: Vec<String>) {
        self.repositories = paths.into_iter().map(|path| RepoRecord { path }).collect();
        self.updated_at = Some(Utc::now());
    }

    pub fn paths(&self) -> Vec<String> {
        self.repositories.iter().map(|r| r.path.clone()).collect()
    }
}

/// A registered external tool: the display name the user picks and the
/// command invoked with a repository path argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ide {
    pub name: String,
    pub shortcut: String,
}

/// `runner-config.json` — everything the user curates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    pub version: u32,
    /// Run-mode names, cycled on the main menu.
    pub modes: Vec<String>,
    /// Assistant startup modes: "No startup command" or the command text.
    pub claude_startup_modes: Vec<String>,
    pub ides: Vec<Ide>,
    /// Repository paths explicitly excluded from management.
    #[serde(default)]
    pub unmanaged_paths: Vec<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub shortcut_prompt_shown: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            modes: vec![
                "claude".to_string(),
                "claude + ide".to_string(),
                "ide only".to_string(),
                "shell".to_string(),
            ],
            claude_startup_modes: vec!["No startup command".to_string()],
            ides: Vec::new(),
            unmanaged_paths: Vec::new(),
            entries: Vec::new(),
            shortcut_prompt_shown: false,
        }
    }
}

/// Local diff statistics, keyed by repository path (plus synthetic group
/// keys). Explicitly stale: correct "as of" `lastScan`, never implicitly
/// refreshed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffCache {
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: HashMap<String, DiffTotals>,
}

/// Branch and ahead/behind figures, keyed by repository path; correct "as
/// of" `lastFetch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCache {
    pub last_fetch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: HashMap<String, RemoteStatus>,
}

/// `cache.json` — expensive git query results, by repository path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCache {
    #[serde(default)]
    pub diffs: DiffCache,
    #[serde(default)]
    pub remote_status: RemoteCache,
}

/// Owns the state directory and all document I/O.
pub struct Store {
    state_dir: PathBuf,
}

impl Store {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn load_repos(&self) -> RepoList {
        self.load_or_default(REPOS_FILE)
    }

    pub fn save_repos(&self, repos: &RepoList) -> Result<()> {
        self.save(REPOS_FILE, repos)
    }

    /// Load the user configuration, normalizing the entry tree to canonical
    /// form (repository leaves never carry children).
    pub fn load_config(&self) -> RunnerConfig {
        let mut config: RunnerConfig = self.load_or_default(CONFIG_FILE);
        entries::normalize(&mut config.entries);
        if config.claude_startup_modes.is_empty() {
            config.claude_startup_modes = RunnerConfig::default().claude_startup_modes;
        }
        if config.modes.is_empty() {
            config.modes = RunnerConfig::default().modes;
        }
        config
    }

    pub fn save_config(&self, config: &RunnerConfig) -> Result<()> {
        self.save(CONFIG_FILE, config)
    }

    /// Load the status cache, folding in a legacy single-purpose diff cache
    /// the first time: if `cache.json` does not exist yet but
    /// `diff-cache.json` does, the old file seeds the diff section. The
    /// combined file is written immediately, so the migration runs once.
    pub fn load_cache(&self) -> StatusCache {
        if !self.path(CACHE_FILE).exists() {
            if let Some(legacy) = self.read_json::<DiffCache>(LEGACY_DIFF_CACHE_FILE) {
                let cache = StatusCache {
                    diffs: legacy,
                    remote_status: RemoteCache::default(),
                };
                // Best effort; a failed write just means the fold-in runs
                // again next startup.
                let _ = self.save_cache(&cache);
                return cache;
            }
        }
        self.load_or_default(CACHE_FILE)
    }

    pub fn save_cache(&self, cache: &StatusCache) -> Result<()> {
        self.save(CACHE_FILE, cache)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.state_dir.join(file)
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Option<T> {
        let contents = fs::read_to_string(self.path(file)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn load_or_default<T: for<'de> Deserialize<'de> + Default>(&self, file: &str) -> T {
        self.read_json(file).unwrap_or_default()
    }

    fn save<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.state_dir).with_context(|| {
            format!("Failed to create state directory: {}", self.state_dir.display())
        })?;
        let contents =
            serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {file}"))?;
        let path = self.path(file);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

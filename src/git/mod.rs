//! Synchronous git queries against working copies.
//!
//! Every query is time-boxed and degrades to `None` (or an empty list) on
//! any failure: missing `.git`, no upstream, timeout, non-zero exit. A batch
//! over many repositories must never be aborted by one uncontactable repo,
//! so nothing in here returns a hard error except [`push`], whose message is
//! surfaced per-repository.
//!
//! All subprocess access funnels through [`run_git`] so a future
//! implementation can swap the execution strategy without touching callers.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Timeout for purely local queries (diff, rev-list, branch lookup).
const LOCAL_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for network operations (fetch, push).
const NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// Combined size of the working copy's pending changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffTotals {
    pub files_changed: u32,
    pub lines_added: u32,
    pub lines_removed: u32,
}

/// Commit-count divergence against a reference branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AheadBehind {
    pub ahead: u32,
    pub behind: u32,
}

/// Branch plus divergence figures for one repository. "Ahead of upstream"
/// and "ahead of the default branch" answer different questions and are
/// kept as two distinct metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatus {
    pub branch: Option<String>,
    pub upstream: Option<AheadBehind>,
    pub main: Option<AheadBehind>,
}

/// One entry of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Two-character porcelain status code.
    pub status: String,
    pub file: String,
}

/// Outcome of pushing a batch of repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    pub pushed: usize,
    pub attempted: usize,
    /// `(path, message)` per failed repository.
    pub errors: Vec<(String, String)>,
}

impl PushSummary {
    /// Human summary line, e.g. "2/3 pushed".
    pub fn headline(&self) -> String {
        format!("{}/{} pushed", self.pushed, self.attempted)
    }
}

/// Run git in `repo`, returning trimmed stdout on success and `None` on
/// spawn failure, non-zero exit, or timeout (the child is killed).
fn run_git(repo: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    // Drain stdout on its own thread: output larger than the pipe buffer
    // would otherwise block the child until the timeout.
    let mut stdout = child.stdout.take()?;
    let reader = thread::spawn(move || {
        let mut out = String::new();
        stdout.read_to_string(&mut out).ok().map(|_| out)
    });

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let out = reader.join().ok().flatten();
                if !status.success() {
                    return None;
                }
                // trim_end only: porcelain status codes are
                // position-sensitive and may start with a space.
                return Some(out?.trim_end().to_string());
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return None;
                }
                thread::sleep(Duration::from_millis(25));
            }
            Err(_) => {
                let _ = reader.join();
                return None;
            }
        }
    }
}

/// Like [`run_git`] but reporting stderr on failure; used by push so the
/// per-repository message can be surfaced.
fn run_git_loud(repo: &Path, args: &[&str], timeout: Duration) -> Result<(), String> {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to run git: {e}"))?;

    // Same draining discipline as run_git, for stderr.
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut err = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut err);
        }
        err
    });

    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let err = reader.join().unwrap_or_default();
                if status.success() {
                    return Ok(());
                }
                let err = err.trim();
                return Err(if err.is_empty() {
                    format!("git exited with {status}")
                } else {
                    err.lines().last().unwrap_or(err).to_string()
                });
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return Err("timed out".to_string());
                }
                thread::sleep(Duration::from_millis(25));
            }
            Err(e) => {
                let _ = reader.join();
                return Err(format!("failed to poll git: {e}"));
            }
        }
    }
}

/// Size of pending local changes: unstaged if any, else staged. A perfectly
/// clean tree is `None`, never a zero-valued struct.
pub fn local_diff(repo: &Path) -> Option<DiffTotals> {
    let unstaged = run_git(repo, &["diff", "--shortstat"], LOCAL_TIMEOUT)?;
    if let Some(totals) = parse_shortstat(&unstaged) {
        return Some(totals);
    }
    let staged = run_git(repo, &["diff", "--cached", "--shortstat"], LOCAL_TIMEOUT)?;
    parse_shortstat(&staged)
}

/// Parse `git diff --shortstat` output, e.g.
/// ` 3 files changed, 10 insertions(+), 2 deletions(-)`.
pub(crate) fn parse_shortstat(line: &str) -> Option<DiffTotals> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut totals = DiffTotals::default();
    for part in line.split(',') {
        let part = part.trim();
        let count: u32 = match part.split_whitespace().next().and_then(|n| n.parse().ok()) {
            Some(count) => count,
            None => continue,
        };
        if part.contains("file") {
            totals.files_changed = count;
        } else if part.contains("insertion") {
            totals.lines_added = count;
        } else if part.contains("deletion") {
            totals.lines_removed = count;
        }
    }
    if totals == DiffTotals::default() {
        None
    } else {
        Some(totals)
    }
}

pub fn current_branch(repo: &Path) -> Option<String> {
    run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"], LOCAL_TIMEOUT)
        .filter(|b| !b.is_empty() && b != "HEAD")
}

/// Ahead/behind vs the configured upstream of HEAD.
pub fn upstream_ahead_behind(repo: &Path) -> Option<AheadBehind> {
    let out = run_git(
        repo,
        &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"],
        LOCAL_TIMEOUT,
    )?;
    parse_ahead_behind(&out)
}

/// Parse `rev-list --left-right --count` output: `"<ahead>\t<behind>"`.
pub(crate) fn parse_ahead_behind(out: &str) -> Option<AheadBehind> {
    let mut parts = out.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some(AheadBehind { ahead, behind })
}

/// The remote's default branch: symbolic `origin/HEAD` when set, else a
/// literal probe for `origin/main` / `origin/master`.
pub fn default_branch(repo: &Path) -> Option<String> {
    if let Some(sym) = run_git(
        repo,
        &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
        LOCAL_TIMEOUT,
    ) {
        if let Some(branch) = sym.strip_prefix("origin/") {
            if !branch.is_empty() {
                return Some(branch.to_string());
            }
        }
    }
    for candidate in ["main", "master"] {
        let ref_name = format!("origin/{candidate}");
        if run_git(repo, &["rev-parse", "--verify", &ref_name], LOCAL_TIMEOUT).is_some() {
            return Some(candidate.to_string());
        }
    }
    None
}

/// Ahead/behind vs the detected default branch. Any inability to compute
/// the comparison (detached HEAD, unknown default, no merge base) is
/// uniformly `None`, never silently zero.
pub fn main_ahead_behind(repo: &Path) -> Option<AheadBehind> {
    let base = default_branch(repo)?;
    let range = format!("HEAD...origin/{base}");
    let out = run_git(
        repo,
        &["rev-list", "--left-right", "--count", &range],
        LOCAL_TIMEOUT,
    )?;
    parse_ahead_behind(&out)
}

/// Branch and both divergence metrics in one probe.
pub fn remote_status(repo: &Path) -> RemoteStatus {
    RemoteStatus {
        branch: current_branch(repo),
        upstream: upstream_ahead_behind(repo),
        main: main_ahead_behind(repo),
    }
}

/// Per-file change list from `git status --porcelain`.
pub fn changed_files(repo: &Path) -> Vec<FileChange> {
    let Some(out) = run_git(repo, &["status", "--porcelain"], LOCAL_TIMEOUT) else {
        return Vec::new();
    };
    parse_porcelain(&out)
}

pub(crate) fn parse_porcelain(out: &str) -> Vec<FileChange> {
    out.lines()
        .filter(|line| line.len() > 3)
        .map(|line| FileChange {
            status: line[..2].to_string(),
            file: line[3..].to_string(),
        })
        .collect()
}

/// Update remote-tracking refs only. Returns whether the fetch succeeded.
pub fn fetch(repo: &Path) -> bool {
    run_git(repo, &["fetch", "--quiet"], NETWORK_TIMEOUT).is_some()
}

/// Push the current branch; the error message is meant for per-repository
/// display.
pub fn push(repo: &Path) -> Result<(), String> {
    run_git_loud(repo, &["push", "--quiet"], NETWORK_TIMEOUT)
}

/// Push every given repository, never aborting the batch on a single
/// failure. `pusher` is injectable so the batch semantics are testable
/// without a git remote.
pub fn push_all<F>(paths: &[String], mut pusher: F) -> PushSummary
where
    F: FnMut(&str) -> Result<(), String>,
{
    let mut summary = PushSummary {
        attempted: paths.len(),
        ..PushSummary::default()
    };
    for path in paths {
        match pusher(path) {
            Ok(()) => summary.pushed += 1,
            Err(msg) => summary.errors.push((path.clone(), msg)),
        }
    }
    summary
}

/// Recompute the local diff for every managed repository. Clean or
/// unreachable repositories are removed from the map rather than recorded
/// as zeros.
pub fn scan_diffs(root: &Path, paths: &[String], diffs: &mut HashMap<String, DiffTotals>) {
    for path in paths {
        match local_diff(&root.join(path)) {
            Some(totals) => {
                diffs.insert(path.clone(), totals);
            }
            None => {
                diffs.remove(path);
            }
        }
    }
}

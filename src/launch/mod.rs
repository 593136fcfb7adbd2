//! Launching external programs for a resolved entry.
//!
//! Detached launches are fire-and-forget: null stdio, spawn, drop the child.
//! A foreground assistant session is returned to the caller as a
//! [`LaunchPlan`] instead of being spawned here, because the terminal must
//! be restored first; `main` runs the plan with inherited stdio and exits
//! with the child's status.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::entries::Entry;
use crate::store::Ide;

/// The action performed on launch, parsed from a configured mode name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Assistant,
    AssistantPlusIde,
    IdeOnly,
    Shell,
}

impl RunMode {
    /// Keyword match so user-edited mode names keep working: "shell" wins,
    /// then a combined claude+ide name, then an ide/editor-only name;
    /// anything else is a plain assistant session.
    pub fn parse(name: &str) -> Self {
        let n = name.to_lowercase();
        let has_ide = n.contains("ide") || n.contains("editor");
        if n.contains("shell") || n.contains("terminal") {
            RunMode::Shell
        } else if has_ide && (n.contains('+') || n.contains("claude")) {
            RunMode::AssistantPlusIde
        } else if has_ide {
            RunMode::IdeOnly
        } else {
            RunMode::Assistant
        }
    }
}

/// Optional leading command for an assistant session, parsed from the
/// startup mode's text: "No startup command" (or blank) means none, an
/// optional leading "run " prefix is stripped, anything else is the command
/// itself. The convention lives in the text, not in structure.
pub fn startup_command(mode: &str) -> Option<String> {
    let text = mode.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("no startup command") {
        return None;
    }
    let command = text
        .strip_prefix("run ")
        .or_else(|| text.strip_prefix("Run "))
        .unwrap_or(text);
    let command = command.trim();
    if command.is_empty() {
        None
    } else {
        Some(command.to_string())
    }
}

/// A foreground command for `main` to run after restoring the terminal.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl LaunchPlan {
    fn assistant(cwd: PathBuf, startup: Option<String>) -> Self {
        Self {
            program: "claude".to_string(),
            args: startup.into_iter().collect(),
            cwd,
        }
    }

    /// Run in the current terminal with inherited stdio; returns the child's
    /// exit code.
    pub fn run_foreground(&self) -> Result<i32> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .status()
            .with_context(|| format!("Failed to run {}", self.program))?;
        Ok(status.code().unwrap_or(1))
    }
}

/// Launch the given entry. Side effects (detached spawns) happen here;
/// `Ok(Some(plan))` means the caller still owes a foreground assistant run.
pub fn launch(
    entry: &Entry,
    run_mode: RunMode,
    startup_mode: &str,
    ides: &[Ide],
    root: &Path,
    detached: bool,
) -> Result<Option<LaunchPlan>> {
    let Some(rel) = entry.repository_path.as_deref() else {
        bail!("'{}' has no repository path", entry.display_name);
    };
    let path = root.join(rel);
    if !path.is_dir() {
        bail!("Path does not exist: {}", path.display());
    }

    match run_mode {
        RunMode::IdeOnly => {
            spawn_ide(entry, ides, &path)?;
            Ok(None)
        }
        RunMode::Shell => {
            spawn_shell_window(&path)?;
            Ok(None)
        }
        RunMode::Assistant | RunMode::AssistantPlusIde => {
            if run_mode == RunMode::AssistantPlusIde {
                spawn_ide(entry, ides, &path)?;
            }
            let startup = startup_command(startup_mode);
            if detached {
                spawn_assistant_window(&path, startup.as_deref())?;
                Ok(None)
            } else {
                Ok(Some(LaunchPlan::assistant(path, startup)))
            }
        }
    }
}

/// The entry's preferred ide, or the first registered one.
fn resolve_ide<'a>(entry: &Entry, ides: &'a [Ide]) -> Option<&'a Ide> {
    entry
        .preferred_ide
        .as_deref()
        .and_then(|name| ides.iter().find(|ide| ide.name == name))
        .or_else(|| ides.first())
}

fn spawn_ide(entry: &Entry, ides: &[Ide], path: &Path) -> Result<()> {
    let Some(ide) = resolve_ide(entry, ides) else {
        bail!("No ide registered; add one to runner-config.json");
    };
    spawn_detached(Command::new(&ide.shortcut).arg(path))
        .with_context(|| format!("Failed to launch {}", ide.name))
}

/// Interactive shell in a new terminal window, rooted at the path.
fn spawn_shell_window(path: &Path) -> Result<()> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    spawn_detached(
        Command::new(terminal_program())
            .arg("-e")
            .arg(&shell)
            .current_dir(path),
    )
    .context("Failed to open a shell window")
}

/// Assistant session in a new terminal window.
fn spawn_assistant_window(path: &Path, startup: Option<&str>) -> Result<()> {
    let mut inner = "exec claude".to_string();
    if let Some(cmd) = startup {
        inner.push_str(&format!(" {}", shell_quote(cmd)));
    }
    spawn_detached(
        Command::new(terminal_program())
            .arg("-e")
            .arg("sh")
            .arg("-c")
            .arg(&inner)
            .current_dir(path),
    )
    .context("Failed to open an assistant window")
}

fn terminal_program() -> String {
    std::env::var("TERMINAL").unwrap_or_else(|_| "x-terminal-emulator".to_string())
}

/// Spawn fire-and-forget: discard stdio, report only the spawn error.
fn spawn_detached(cmd: &mut Command) -> Result<()> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(Into::into)
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_parsing_matches_default_mode_names() {
        assert_eq!(RunMode::parse("claude"), RunMode::Assistant);
        assert_eq!(RunMode::parse("claude + ide"), RunMode::AssistantPlusIde);
        assert_eq!(RunMode::parse("ide only"), RunMode::IdeOnly);
        assert_eq!(RunMode::parse("shell"), RunMode::Shell);
    }

    #[test]
    fn run_mode_parsing_tolerates_renamed_modes() {
        assert_eq!(RunMode::parse("Open in editor"), RunMode::IdeOnly);
        assert_eq!(RunMode::parse("Terminal here"), RunMode::Shell);
        assert_eq!(RunMode::parse("just claude"), RunMode::Assistant);
    }

    #[test]
    fn startup_command_none_convention() {
        assert_eq!(startup_command("No startup command"), None);
        assert_eq!(startup_command("no startup command"), None);
        assert_eq!(startup_command("   "), None);
    }

    #[test]
    fn startup_command_strips_run_prefix() {
        assert_eq!(
            startup_command("run /catch-up").as_deref(),
            Some("/catch-up")
        );
        assert_eq!(startup_command("Run /review").as_deref(), Some("/review"));
        assert_eq!(startup_command("/plan").as_deref(), Some("/plan"));
    }

    #[test]
    fn launch_missing_path_errors_without_spawning() {
        let entry = Entry::repository("does/not/exist");
        let err = launch(
            &entry,
            RunMode::Assistant,
            "No startup command",
            &[],
            Path::new("/nonexistent-root"),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn launch_ide_only_without_registry_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        let entry = Entry::repository("app");
        let err = launch(
            &entry,
            RunMode::IdeOnly,
            "No startup command",
            &[],
            dir.path(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("No ide registered"));
    }

    #[test]
    fn foreground_assistant_returns_a_plan_with_startup_argument() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        let entry = Entry::repository("app");
        let plan = launch(
            &entry,
            RunMode::Assistant,
            "run /catch-up",
            &[],
            dir.path(),
            false,
        )
        .unwrap()
        .expect("foreground launch should yield a plan");
        assert_eq!(plan.program, "claude");
        assert_eq!(plan.args, vec!["/catch-up"]);
        assert_eq!(plan.cwd, dir.path().join("app"));
    }

    #[test]
    fn resolve_ide_prefers_entry_setting_then_first_registered() {
        let ides = vec![
            Ide {
                name: "code".to_string(),
                shortcut: "code".to_string(),
            },
            Ide {
                name: "zed".to_string(),
                shortcut: "zed".to_string(),
            },
        ];
        let mut entry = Entry::repository("app");
        assert_eq!(resolve_ide(&entry, &ides).unwrap().name, "code");
        entry.preferred_ide = Some("zed".to_string());
        assert_eq!(resolve_ide(&entry, &ides).unwrap().name, "zed");
        entry.preferred_ide = Some("gone".to_string());
        assert_eq!(resolve_ide(&entry, &ides).unwrap().name, "code");
    }
}

//! Main-menu keys: navigate the tree, expand/collapse, cycle modes, launch.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, Mode, RemoteState};
use crate::entries::Entry;
use crate::launch::{self, RunMode};

use super::{step, KeyAction};

pub fn handle(app: &mut App, key: KeyEvent) -> (Mode, KeyAction) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return (Mode::Main, KeyAction::Quit),
        KeyCode::Down | KeyCode::Char('j') => {
            app.selected = step(app.selected, app.rows.len(), true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.selected = step(app.selected, app.rows.len(), false);
        }
        KeyCode::Right | KeyCode::Char('l') => {
            set_expanded(app, true);
        }
        KeyCode::Left | KeyCode::Char('h') => {
            set_expanded(app, false);
        }
        KeyCode::Enter => {
            if let Some(entry) = selected_entry(app) {
                if entry.is_group() {
                    toggle_expanded(app);
                } else {
                    return (Mode::Main, launch_entry(app, &entry, false));
                }
            }
        }
        // Launch in a new window instead of taking over this terminal.
        KeyCode::Char('w') => {
            if let Some(entry) = selected_entry(app) {
                if !entry.is_group() {
                    return (Mode::Main, launch_entry(app, &entry, true));
                }
            }
        }
        KeyCode::Char('m') => app.cycle_run_mode(),
        KeyCode::Char('s') => app.cycle_startup_mode(),
        KeyCode::Char('d') => return (Mode::Main, KeyAction::ScanDiffs),
        KeyCode::Char('c') => return (Mode::ConfigMenu { selected: 0 }, KeyAction::Continue),
        KeyCode::Char('r') => {
            let mut repos = app.managed_paths();
            repos.sort();
            return (Mode::Remote(RemoteState::new(repos)), KeyAction::Continue);
        }
        KeyCode::Char('o') => {
            // Offered only while unclaimed managed repositories exist.
            if !app.other_managed().is_empty() {
                return (Mode::OtherManaged { selected: 0 }, KeyAction::Continue);
            }
        }
        _ => {}
    }
    (Mode::Main, KeyAction::Continue)
}

fn selected_entry(app: &App) -> Option<Entry> {
    let row = app.rows.get(app.selected)?;
    app.entry_at(&row.path).cloned()
}

fn set_expanded(app: &mut App, expanded: bool) {
    let Some(path) = app.rows.get(app.selected).map(|r| r.path.clone()) else {
        return;
    };
    if let Some(entry) = crate::entries::entry_at_mut(&mut app.config.entries, &path) {
        if entry.is_group() {
            entry.is_expanded = expanded;
        }
    }
    app.refresh_rows();
}

fn toggle_expanded(app: &mut App) {
    let expanded = app
        .rows
        .get(app.selected)
        .and_then(|r| app.entry_at(&r.path))
        .is_some_and(|e| e.is_expanded);
    set_expanded(app, !expanded);
}

/// Launch an entry with the current run and startup modes. Detached spawns
/// complete here; a foreground assistant is handed to the event loop.
pub(super) fn launch_entry(app: &mut App, entry: &Entry, detached: bool) -> KeyAction {
    let run_mode = RunMode::parse(app.current_run_mode_name());
    let startup = app.current_startup_mode().to_string();
    match launch::launch(entry, run_mode, &startup, &app.config.ides, &app.root, detached) {
        Ok(Some(plan)) => KeyAction::Launch(plan),
        Ok(None) => {
            app.status
                .success(format!("Launched {}", entry.display_name));
            KeyAction::Continue
        }
        Err(e) => {
            app.status.error(e.to_string());
            KeyAction::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RepoList, RunnerConfig, Store};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(entries: Vec<Entry>, repos: &[&str]) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let store = Store::new(&state_dir);
        let mut list = RepoList::default();
        list.replace(repos.iter().map(|s| (*s).to_string()).collect());
        store.save_repos(&list).unwrap();
        let config = RunnerConfig {
            entries,
            shortcut_prompt_shown: true,
            ..RunnerConfig::default()
        };
        store.save_config(&config).unwrap();
        (App::new(dir.path(), &state_dir, None), dir)
    }

    #[test]
    fn enter_on_group_toggles_expansion() {
        let mut group = Entry::group("g");
        group.children.push(Entry::repository("g/a"));
        let (mut app, _dir) = test_app(vec![group], &["g/a"]);
        assert_eq!(app.rows.len(), 2);

        let (mode, _) = handle(&mut app, key(KeyCode::Enter));
        assert!(matches!(mode, Mode::Main));
        assert_eq!(app.rows.len(), 1);
    }

    #[test]
    fn other_managed_key_is_withheld_when_everything_is_claimed() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        let (mode, _) = handle(&mut app, key(KeyCode::Char('o')));
        assert!(matches!(mode, Mode::Main));
    }

    #[test]
    fn other_managed_key_opens_submenu_when_unclaimed_repos_exist() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a", "b"]);
        let (mode, _) = handle(&mut app, key(KeyCode::Char('o')));
        assert!(matches!(mode, Mode::OtherManaged { selected: 0 }));
    }

    #[test]
    fn launching_a_missing_path_reports_inline_and_stays_put() {
        let (mut app, _dir) = test_app(vec![Entry::repository("gone")], &["gone"]);
        let (mode, action) = handle(&mut app, key(KeyCode::Enter));
        assert!(matches!(mode, Mode::Main));
        assert!(matches!(action, KeyAction::Continue));
        assert!(app.status.current().is_some());
    }

    #[test]
    fn mode_cycle_keys_advance_indices() {
        let (mut app, _dir) = test_app(vec![], &[]);
        handle(&mut app, key(KeyCode::Char('m')));
        assert_eq!(app.mode_index, 1);
        handle(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.startup_index, 0); // single startup mode wraps to itself
    }
}

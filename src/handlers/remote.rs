//! Remote-status dashboard and "other managed" submenu keys.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, Mode, RemoteState};
use crate::entries::Entry;
use crate::git;

use super::{main_menu, step, KeyAction};

/// Dashboard over the managed repositories: everything shown comes from the
/// cache ("as of last fetch"); `f` and `p` are the only keys that touch the
/// network, and neither mutates the tree.
pub fn handle(app: &mut App, mut state: RemoteState, key: KeyEvent) -> (Mode, KeyAction) {
    if state.report.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => state.report = None,
            _ => {}
        }
        return (Mode::Remote(state), KeyAction::Continue);
    }
    if state.files.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => state.files = None,
            _ => {}
        }
        return (Mode::Remote(state), KeyAction::Continue);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return (Mode::Main, KeyAction::Continue),
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected = step(state.selected, state.repos.len(), true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = step(state.selected, state.repos.len(), false);
        }
        KeyCode::Char('f') => return (Mode::Remote(state), KeyAction::FetchAll),
        KeyCode::Char('p') => return (Mode::Remote(state), KeyAction::PushAll),
        KeyCode::Enter => {
            if let Some(path) = state.repos.get(state.selected) {
                let files = git::changed_files(&app.root.join(path));
                if files.is_empty() {
                    app.status.info(format!("{path}: no local changes"));
                } else {
                    state.files = Some((path.clone(), files));
                }
            }
        }
        _ => {}
    }
    (Mode::Remote(state), KeyAction::Continue)
}

/// Launch a repository that is managed but has no tree entry, without
/// requiring it to be added first. The candidate list is recomputed on
/// every key so it tracks in-memory edits.
pub fn handle_other(app: &mut App, selected: usize, key: KeyEvent) -> (Mode, KeyAction) {
    let candidates = app.other_managed();
    if candidates.is_empty() {
        return (Mode::Main, KeyAction::Continue);
    }
    let selected = selected.min(candidates.len() - 1);

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => (Mode::Main, KeyAction::Continue),
        KeyCode::Down | KeyCode::Char('j') => (
            Mode::OtherManaged {
                selected: step(selected, candidates.len(), true),
            },
            KeyAction::Continue,
        ),
        KeyCode::Up | KeyCode::Char('k') => (
            Mode::OtherManaged {
                selected: step(selected, candidates.len(), false),
            },
            KeyAction::Continue,
        ),
        KeyCode::Enter | KeyCode::Char('w') => {
            let entry = Entry::repository(&candidates[selected]);
            let detached = key.code == KeyCode::Char('w');
            let action = main_menu::launch_entry(app, &entry, detached);
            (Mode::OtherManaged { selected }, action)
        }
        _ => (Mode::OtherManaged { selected }, KeyAction::Continue),
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
    fn fetch_and_push_keys_defer_to_the_event_loop() {
        let (mut app, _dir) = test_app(vec![], &["a"]);
        let (_, action) = handle(&mut app, RemoteState::new(vec!["a".to_string()]), key(KeyCode::Char('f')));
        assert!(matches!(action, KeyAction::FetchAll));
        let (_, action) = handle(&mut app, RemoteState::new(vec!["a".to_string()]), key(KeyCode::Char('p')));
        assert!(matches!(action, KeyAction::PushAll));
    }

    #[test]
    fn escape_leaves_the_dashboard_without_touching_the_tree() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        let (mode, _) = handle(&mut app, RemoteState::new(vec!["a".to_string()]), key(KeyCode::Esc));
        assert!(matches!(mode, Mode::Main));
        assert_eq!(app.config.entries.len(), 1);
    }

    #[test]
    fn files_panel_closes_before_other_keys_apply() {
        let (mut app, _dir) = test_app(vec![], &["a"]);
        let mut state = RemoteState::new(vec!["a".to_string()]);
        state.files = Some(("a".to_string(), Vec::new()));
        let (mode, _) = handle(&mut app, state, key(KeyCode::Esc));
        let Mode::Remote(state) = mode else {
            panic!("expected to stay on the dashboard");
        };
        assert!(state.files.is_none());
    }

    #[test]
    fn push_report_panel_closes_on_escape() {
        let (mut app, _dir) = test_app(vec![], &["a"]);
        let mut state = RemoteState::new(vec!["a".to_string()]);
        state.report = Some(crate::git::PushSummary {
            pushed: 0,
            attempted: 2,
            errors: vec![
                ("a".to_string(), "rejected".to_string()),
                ("b".to_string(), "no upstream".to_string()),
            ],
        });
        let (mode, _) = handle(&mut app, state, key(KeyCode::Esc));
        let Mode::Remote(state) = mode else {
            panic!("expected to stay on the dashboard");
        };
        assert!(state.report.is_none());
    }

    #[test]
    fn other_managed_returns_to_main_when_nothing_is_left() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        let (mode, _) = handle_other(&mut app, 0, key(KeyCode::Down));
        assert!(matches!(mode, Mode::Main));
    }

    #[test]
    fn other_managed_navigation_clamps_to_the_candidate_list() {
        let (mut app, _dir) = test_app(vec![], &["a", "b"]);
        let (mode, _) = handle_other(&mut app, 5, key(KeyCode::Down));
        assert!(matches!(mode, Mode::OtherManaged { selected: 1 }));
    }
}

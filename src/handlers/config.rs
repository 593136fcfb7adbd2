//! Config-menu keys plus the modes it fans out to: repository visibility,
//! startup-mode editing, and the one-time first-run prompt.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    App, EditorState, Mode, StartupEdit, StartupState, VisibilityState, CONFIG_MENU_ITEMS,
};
use crate::entries;
use crate::shortcut;

use super::{step, KeyAction};

pub fn handle_menu(app: &mut App, selected: usize, key: KeyEvent) -> (Mode, KeyAction) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => (Mode::Main, KeyAction::Continue),
        KeyCode::Down | KeyCode::Char('j') => (
            Mode::ConfigMenu {
                selected: step(selected, CONFIG_MENU_ITEMS.len(), true),
            },
            KeyAction::Continue,
        ),
        KeyCode::Up | KeyCode::Char('k') => (
            Mode::ConfigMenu {
                selected: step(selected, CONFIG_MENU_ITEMS.len(), false),
            },
            KeyAction::Continue,
        ),
        KeyCode::Enter => match selected {
            0 => (Mode::EntriesEdit(EditorState::new()), KeyAction::Continue),
            1 => (
                Mode::Visibility(VisibilityState { selected: 0 }),
                KeyAction::Continue,
            ),
            2 => (Mode::ConfigMenu { selected }, KeyAction::ScanRepos),
            3 => {
                match shortcut::create_shortcut(app.launch_script.as_deref()) {
                    Ok(path) => app
                        .status
                        .success(format!("Shortcut created: {}", path.display())),
                    Err(e) => app.status.error(e.to_string()),
                }
                (Mode::ConfigMenu { selected }, KeyAction::Continue)
            }
            _ => (Mode::StartupModes(StartupState::new()), KeyAction::Continue),
        },
        _ => (Mode::ConfigMenu { selected }, KeyAction::Continue),
    }
}

/// Repository-visibility manager. The selection walks the full discovered
/// list so unmanaged repositories can be re-managed; toggling a repository
/// to unmanaged also prunes its tree entry in the same in-memory edit, and
/// Enter persists both together.
pub fn handle_visibility(
    app: &mut App,
    mut state: VisibilityState,
    key: KeyEvent,
) -> (Mode, KeyAction) {
    let repos = discovered_sorted(app);
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.discard_config();
            return (Mode::ConfigMenu { selected: 1 }, KeyAction::Continue);
        }
        KeyCode::Enter => {
            app.commit_config();
            return (Mode::ConfigMenu { selected: 1 }, KeyAction::Continue);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.selected = step(state.selected, repos.len(), true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = step(state.selected, repos.len(), false);
        }
        KeyCode::Char(' ') | KeyCode::Char('t') => {
            if let Some(path) = repos.get(state.selected) {
                toggle_unmanaged(app, path);
            }
        }
        _ => {}
    }
    (Mode::Visibility(state), KeyAction::Continue)
}

/// Every discovered repository, managed or not, in stable order.
pub fn discovered_sorted(app: &App) -> Vec<String> {
    let mut repos = app.repos.paths();
    repos.sort();
    repos
}

fn toggle_unmanaged(app: &mut App, path: &str) {
    if let Some(pos) = app.config.unmanaged_paths.iter().position(|p| p == path) {
        app.config.unmanaged_paths.remove(pos);
    } else {
        app.config.unmanaged_paths.push(path.to_string());
        entries::remove_repository(&mut app.config.entries, path);
        app.refresh_rows();
    }
}

/// Startup-modes editor: add, rename, reorder, remove. Removing the last
/// mode is withheld rather than rejected.
pub fn handle_startup(app: &mut App, mut state: StartupState, key: KeyEvent) -> (Mode, KeyAction) {
    if let Some(edit) = state.editing.take() {
        state.editing = apply_startup_edit(app, &mut state.selected, edit, key);
        return (Mode::StartupModes(state), KeyAction::Continue);
    }

    let len = app.config.claude_startup_modes.len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.discard_config();
            return (Mode::ConfigMenu { selected: 4 }, KeyAction::Continue);
        }
        KeyCode::Enter => {
            app.commit_config();
            return (Mode::ConfigMenu { selected: 4 }, KeyAction::Continue);
        }
        KeyCode::Down | KeyCode::Char('j') => state.selected = step(state.selected, len, true),
        KeyCode::Up | KeyCode::Char('k') => state.selected = step(state.selected, len, false),
        KeyCode::Char('J') => {
            if state.selected + 1 < len {
                app.config
                    .claude_startup_modes
                    .swap(state.selected, state.selected + 1);
                state.selected += 1;
            }
        }
        KeyCode::Char('K') => {
            if state.selected > 0 {
                app.config
                    .claude_startup_modes
                    .swap(state.selected, state.selected - 1);
                state.selected -= 1;
            }
        }
        KeyCode::Char('a') => {
            state.editing = Some(StartupEdit::Add {
                buffer: String::new(),
            });
        }
        KeyCode::Char('r') => {
            if let Some(current) = app.config.claude_startup_modes.get(state.selected) {
                state.editing = Some(StartupEdit::Rename {
                    buffer: current.clone(),
                });
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            // The last mode cannot be removed.
            if len > 1 {
                app.config.claude_startup_modes.remove(state.selected);
                state.selected = state.selected.min(len - 2);
            }
        }
        _ => {}
    }
    (Mode::StartupModes(state), KeyAction::Continue)
}

/// One keystroke of an inline startup-mode edit; returns the edit state to
/// keep, or `None` once it is confirmed or cancelled.
fn apply_startup_edit(
    app: &mut App,
    selected: &mut usize,
    edit: StartupEdit,
    key: KeyEvent,
) -> Option<StartupEdit> {
    let (mut buffer, renaming) = match edit {
        StartupEdit::Rename { buffer } => (buffer, true),
        StartupEdit::Add { buffer } => (buffer, false),
    };
    match key.code {
        KeyCode::Esc => return None,
        KeyCode::Enter => {
            let text = buffer.trim().to_string();
            if !text.is_empty() {
                if renaming {
                    if let Some(mode) = app.config.claude_startup_modes.get_mut(*selected) {
                        *mode = text;
                    }
                } else {
                    app.config.claude_startup_modes.push(text);
                    *selected = app.config.claude_startup_modes.len() - 1;
                }
            }
            return None;
        }
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) => buffer.push(c),
        _ => {}
    }
    Some(if renaming {
        StartupEdit::Rename { buffer }
    } else {
        StartupEdit::Add { buffer }
    })
}

/// One-time shortcut offer at startup. Whatever the answer, it is recorded
/// permanently so the prompt never returns.
pub fn handle_first_run(app: &mut App, key: KeyEvent) -> (Mode, KeyAction) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            match shortcut::create_shortcut(app.launch_script.as_deref()) {
                Ok(path) => app
                    .status
                    .success(format!("Shortcut created: {}", path.display())),
                Err(e) => app.status.error(e.to_string()),
            }
            if let Err(e) = app.record_shortcut_prompt() {
                app.status.error(format!("Save failed: {e}"));
            }
            (Mode::Main, KeyAction::Continue)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Enter => {
            if let Err(e) = app.record_shortcut_prompt() {
                app.status.error(format!("Save failed: {e}"));
            }
            (Mode::Main, KeyAction::Continue)
        }
        _ => (Mode::FirstRun, KeyAction::Continue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::Entry;
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
    fn toggling_to_unmanaged_prunes_the_tree_entry_in_the_same_edit() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a", "b"]);
        let (mode, _) = handle_visibility(
            &mut app,
            VisibilityState { selected: 0 },
            key(KeyCode::Char(' ')),
        );
        assert!(matches!(mode, Mode::Visibility(_)));
        assert_eq!(app.config.unmanaged_paths, vec!["a"]);
        assert!(app.config.entries.is_empty());
    }

    #[test]
    fn visibility_escape_discards_both_set_and_pruned_tree() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        handle_visibility(
            &mut app,
            VisibilityState { selected: 0 },
            key(KeyCode::Char(' ')),
        );
        let (mode, _) = handle_visibility(&mut app, VisibilityState { selected: 0 }, key(KeyCode::Esc));
        assert!(matches!(mode, Mode::ConfigMenu { .. }));
        assert!(app.config.unmanaged_paths.is_empty());
        assert_eq!(app.config.entries.len(), 1);
    }

    #[test]
    fn visibility_enter_persists_the_toggle() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        handle_visibility(
            &mut app,
            VisibilityState { selected: 0 },
            key(KeyCode::Char(' ')),
        );
        handle_visibility(&mut app, VisibilityState { selected: 0 }, key(KeyCode::Enter));
        let reloaded = app.store.load_config();
        assert_eq!(reloaded.unmanaged_paths, vec!["a"]);
        assert!(reloaded.entries.is_empty());
    }

    #[test]
    fn removing_the_last_startup_mode_is_withheld() {
        let (mut app, _dir) = test_app(vec![], &[]);
        assert_eq!(app.config.claude_startup_modes.len(), 1);
        let (mode, _) = handle_startup(&mut app, StartupState::new(), key(KeyCode::Char('d')));
        assert!(matches!(mode, Mode::StartupModes(_)));
        assert_eq!(app.config.claude_startup_modes.len(), 1);
    }

    #[test]
    fn startup_add_then_commit_persists_the_new_mode() {
        let (mut app, _dir) = test_app(vec![], &[]);
        let mut mode = Mode::StartupModes(StartupState::new());
        for k in [
            key(KeyCode::Char('a')),
            key(KeyCode::Char('r')),
            key(KeyCode::Char('u')),
            key(KeyCode::Char('n')),
            key(KeyCode::Char(' ')),
            key(KeyCode::Char('/')),
            key(KeyCode::Char('x')),
            key(KeyCode::Enter),
            key(KeyCode::Enter),
        ] {
            let Mode::StartupModes(state) = mode else {
                break;
            };
            mode = handle_startup(&mut app, state, k).0;
        }
        let reloaded = app.store.load_config();
        assert!(reloaded
            .claude_startup_modes
            .contains(&"run /x".to_string()));
    }

    #[test]
    fn startup_reorder_moves_the_selected_mode() {
        let (mut app, _dir) = test_app(vec![], &[]);
        app.config.claude_startup_modes = vec!["one".to_string(), "two".to_string()];
        let (mode, _) = handle_startup(&mut app, StartupState::new(), key(KeyCode::Char('J')));
        assert_eq!(app.config.claude_startup_modes, vec!["two", "one"]);
        let Mode::StartupModes(state) = mode else {
            panic!("expected startup mode");
        };
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn first_run_answer_is_recorded_for_either_choice() {
        let (mut app, _dir) = test_app(vec![], &[]);
        app.config.shortcut_prompt_shown = false;
        let (mode, _) = handle_first_run(&mut app, key(KeyCode::Char('n')));
        assert!(matches!(mode, Mode::Main));
        assert!(app.store.load_config().shortcut_prompt_shown);
    }

    #[test]
    fn config_menu_enter_opens_the_selected_mode() {
        let (mut app, _dir) = test_app(vec![], &[]);
        let (mode, _) = handle_menu(&mut app, 0, key(KeyCode::Enter));
        assert!(matches!(mode, Mode::EntriesEdit(_)));
        let (mode, _) = handle_menu(&mut app, 1, key(KeyCode::Enter));
        assert!(matches!(mode, Mode::Visibility(_)));
        let (_, action) = handle_menu(&mut app, 2, key(KeyCode::Enter));
        assert!(matches!(action, KeyAction::ScanRepos));
    }
}

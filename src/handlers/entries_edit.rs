//! Entries-edit keys: restructure the tree, with one modal at a time for
//! add/nest/group/rename. The whole session commits on Enter and discards
//! on Escape; each modal applies or discards exactly one tree mutation and
//! returns to the editor.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, EditorModal, EditorState, Mode};
use crate::entries::{self, Entry, MoveDir};

use super::{step, KeyAction};

pub fn handle(app: &mut App, mut editor: EditorState, key: KeyEvent) -> (Mode, KeyAction) {
    if let Some(modal) = editor.modal.take() {
        editor.modal = handle_modal(app, &mut editor, modal, key);
        return (Mode::EntriesEdit(editor), KeyAction::Continue);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.discard_config();
            return (Mode::ConfigMenu { selected: 0 }, KeyAction::Continue);
        }
        KeyCode::Enter => {
            app.commit_config();
            return (Mode::ConfigMenu { selected: 0 }, KeyAction::Continue);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            editor.selected = step(editor.selected, app.rows.len(), true);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            editor.selected = step(editor.selected, app.rows.len(), false);
        }
        KeyCode::Char('J') => move_selected(app, &mut editor, MoveDir::Down),
        KeyCode::Char('K') => move_selected(app, &mut editor, MoveDir::Up),
        KeyCode::Char('a') => {
            let candidates = app.other_managed();
            if candidates.is_empty() {
                app.status.info("Every managed repository already has an entry");
            } else {
                editor.modal = Some(EditorModal::AddEntry {
                    candidates,
                    selected: 0,
                });
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(path) = selected_path(app, &editor) {
                entries::remove_at(&mut app.config.entries, &path);
                app.refresh_rows();
                editor.selected = editor.selected.min(app.rows.len().saturating_sub(1));
            }
        }
        KeyCode::Char('r') => {
            if let Some(entry) = selected_entry(app, &editor) {
                editor.modal = Some(EditorModal::Rename {
                    buffer: entry.display_name.clone(),
                });
            }
        }
        KeyCode::Char('g') => {
            // Grouping works on root-level entries sharing a first path
            // segment; fewer than two matches means the option is withheld.
            if let Some(prefix) = selected_entry(app, &editor).and_then(group_prefix) {
                let count = entries::prefix_matches(&app.config.entries, &prefix).len();
                if count >= 2 {
                    editor.modal = Some(EditorModal::GroupConfirm { prefix, count });
                } else {
                    app.status.info("No other root entry shares this prefix");
                }
            }
        }
        KeyCode::Char('u') => {
            if let Some(path) = selected_path(app, &editor) {
                if entries::flatten_group(&mut app.config.entries, &path) {
                    app.refresh_rows();
                    editor.selected = editor.selected.min(app.rows.len().saturating_sub(1));
                }
            }
        }
        KeyCode::Char('n') => {
            if let Some(path) = selected_path(app, &editor) {
                let targets = entries::nest_targets(&app.config.entries, &path);
                editor.modal = Some(EditorModal::Nest {
                    source: path,
                    targets,
                    selected: 0,
                });
            }
        }
        KeyCode::Char('t') => cycle_preferred_ide(app, &editor),
        _ => {}
    }
    (Mode::EntriesEdit(editor), KeyAction::Continue)
}

fn selected_path(app: &App, editor: &EditorState) -> Option<Vec<usize>> {
    app.rows.get(editor.selected).map(|r| r.path.clone())
}

fn selected_entry<'a>(app: &'a App, editor: &EditorState) -> Option<&'a Entry> {
    let row = app.rows.get(editor.selected)?;
    app.entry_at(&row.path)
}

/// Swap with a sibling and follow the entry to its new visible row.
fn move_selected(app: &mut App, editor: &mut EditorState, dir: MoveDir) {
    let Some(path) = selected_path(app, editor) else {
        return;
    };
    let new_path = entries::move_entry(&mut app.config.entries, &path, dir);
    app.refresh_rows();
    if let Some(idx) = app.rows.iter().position(|r| r.path == new_path) {
        editor.selected = idx;
    }
}

/// First path segment of a root-level repository entry; nested entries do
/// not participate in grouping.
fn group_prefix(entry: &Entry) -> Option<String> {
    entries::first_segment(entry).map(str::to_string)
}

/// Cycle the selected entry's preferred ide through none and every
/// registered one.
fn cycle_preferred_ide(app: &mut App, editor: &EditorState) {
    let Some(path) = selected_path(app, editor) else {
        return;
    };
    let names: Vec<String> = app.config.ides.iter().map(|i| i.name.clone()).collect();
    if names.is_empty() {
        app.status.info("No ide registered; add one to runner-config.json");
        return;
    }
    let Some(entry) = entries::entry_at_mut(&mut app.config.entries, &path) else {
        return;
    };
    entry.preferred_ide = match entry.preferred_ide.as_deref() {
        None => Some(names[0].clone()),
        Some(current) => {
            let pos = names.iter().position(|n| n == current);
            match pos {
                Some(i) if i + 1 < names.len() => Some(names[i + 1].clone()),
                _ => None,
            }
        }
    };
}

/// One keystroke of the active modal; returns the modal to keep, or `None`
/// once it has applied or discarded its mutation.
fn handle_modal(
    app: &mut App,
    editor: &mut EditorState,
    modal: EditorModal,
    key: KeyEvent,
) -> Option<EditorModal> {
    match modal {
        EditorModal::AddEntry {
            candidates,
            mut selected,
        } => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => None,
            KeyCode::Down | KeyCode::Char('j') => {
                selected = step(selected, candidates.len(), true);
                Some(EditorModal::AddEntry {
                    candidates,
                    selected,
                })
            }
            KeyCode::Up | KeyCode::Char('k') => {
                selected = step(selected, candidates.len(), false);
                Some(EditorModal::AddEntry {
                    candidates,
                    selected,
                })
            }
            KeyCode::Enter => {
                if let Some(path) = candidates.get(selected) {
                    app.config.entries.push(Entry::repository(path));
                    app.refresh_rows();
                    editor.selected = app.rows.len().saturating_sub(1);
                }
                None
            }
            _ => Some(EditorModal::AddEntry {
                candidates,
                selected,
            }),
        },
        EditorModal::Nest {
            source,
            targets,
            mut selected,
        } => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => None,
            KeyCode::Down | KeyCode::Char('j') => {
                selected = step(selected, targets.len(), true);
                Some(EditorModal::Nest {
                    source,
                    targets,
                    selected,
                })
            }
            KeyCode::Up | KeyCode::Char('k') => {
                selected = step(selected, targets.len(), false);
                Some(EditorModal::Nest {
                    source,
                    targets,
                    selected,
                })
            }
            KeyCode::Enter => {
                if let Some(target) = targets.get(selected) {
                    entries::nest(&mut app.config.entries, &source, target.as_deref());
                    app.refresh_rows();
                    editor.selected = editor.selected.min(app.rows.len().saturating_sub(1));
                }
                None
            }
            _ => Some(EditorModal::Nest {
                source,
                targets,
                selected,
            }),
        },
        EditorModal::GroupConfirm { prefix, count } => match key.code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                if entries::group_by_prefix(&mut app.config.entries, &prefix) {
                    app.refresh_rows();
                }
                None
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('q') => None,
            _ => Some(EditorModal::GroupConfirm { prefix, count }),
        },
        EditorModal::Rename { mut buffer } => match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                let name = buffer.trim().to_string();
                if !name.is_empty() {
                    if let Some(path) = selected_path(app, editor) {
                        if let Some(entry) = entries::entry_at_mut(&mut app.config.entries, &path)
                        {
                            entry.display_name = name;
                        }
                    }
                }
                None
            }
            KeyCode::Backspace => {
                buffer.pop();
                Some(EditorModal::Rename { buffer })
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                Some(EditorModal::Rename { buffer })
            }
            _ => Some(EditorModal::Rename { buffer }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Ide, RepoList, RunnerConfig, Store};
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

    fn editor_after(app: &mut App, editor: EditorState, k: KeyEvent) -> EditorState {
        match handle(app, editor, k).0 {
            Mode::EntriesEdit(editor) => editor,
            _ => panic!("left the editor unexpectedly"),
        }
    }

    #[test]
    fn add_modal_offers_only_unclaimed_repositories() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a", "b"]);
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('a')));
        match &editor.modal {
            Some(EditorModal::AddEntry { candidates, .. }) => {
                assert_eq!(candidates, &vec!["b".to_string()]);
            }
            other => panic!("expected add modal, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn add_modal_confirm_appends_at_root() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a", "b"]);
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('a')));
        let editor = editor_after(&mut app, editor, key(KeyCode::Enter));
        assert!(editor.modal.is_none());
        assert_eq!(
            entries::claimed_paths(&app.config.entries),
            vec!["a", "b"]
        );
    }

    #[test]
    fn group_key_is_withheld_with_fewer_than_two_matches() {
        let (mut app, _dir) = test_app(
            vec![Entry::repository("org/a"), Entry::repository("solo")],
            &["org/a", "solo"],
        );
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('g')));
        assert!(editor.modal.is_none());
        assert_eq!(app.config.entries.len(), 2);
    }

    #[test]
    fn group_confirm_wraps_matches_in_a_group() {
        let (mut app, _dir) = test_app(
            vec![Entry::repository("org/a"), Entry::repository("org/b")],
            &["org/a", "org/b"],
        );
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('g')));
        assert!(matches!(
            editor.modal,
            Some(EditorModal::GroupConfirm { ref prefix, count: 2 }) if prefix == "org"
        ));
        editor_after(&mut app, editor, key(KeyCode::Char('y')));
        assert_eq!(app.config.entries.len(), 1);
        assert!(app.config.entries[0].is_group());
    }

    #[test]
    fn nest_modal_applies_the_selected_target() {
        let mut group = Entry::group("g");
        group.children.push(Entry::repository("g/x"));
        let (mut app, _dir) = test_app(
            vec![Entry::repository("a"), group],
            &["a", "g/x"],
        );
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('n')));
        // Targets are [root, the "g" group]; pick the group.
        let editor = editor_after(&mut app, editor, key(KeyCode::Char('j')));
        editor_after(&mut app, editor, key(KeyCode::Enter));
        assert_eq!(app.config.entries.len(), 1);
        assert_eq!(app.config.entries[0].children.len(), 2);
    }

    #[test]
    fn rename_modal_edits_the_display_name() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        let mut editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('r')));
        for c in ['!', '!'] {
            editor = editor_after(&mut app, editor, key(KeyCode::Char(c)));
        }
        editor_after(&mut app, editor, key(KeyCode::Enter));
        assert_eq!(app.config.entries[0].display_name, "a!!");
    }

    #[test]
    fn escape_discards_the_whole_editing_session() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('d')));
        assert!(app.config.entries.is_empty());
        let (mode, _) = handle(&mut app, editor, key(KeyCode::Esc));
        assert!(matches!(mode, Mode::ConfigMenu { .. }));
        assert_eq!(app.config.entries.len(), 1);
    }

    #[test]
    fn enter_commits_the_edited_tree() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('d')));
        handle(&mut app, editor, key(KeyCode::Enter));
        assert!(app.store.load_config().entries.is_empty());
    }

    #[test]
    fn move_keys_follow_the_entry_to_its_new_row() {
        let (mut app, _dir) = test_app(
            vec![Entry::repository("a"), Entry::repository("b")],
            &["a", "b"],
        );
        let editor = editor_after(&mut app, EditorState::new(), key(KeyCode::Char('J')));
        assert_eq!(editor.selected, 1);
        assert_eq!(
            entries::claimed_paths(&app.config.entries),
            vec!["b", "a"]
        );
    }

    #[test]
    fn ide_cycle_walks_none_then_each_registered_ide() {
        let (mut app, _dir) = test_app(vec![Entry::repository("a")], &["a"]);
        app.config.ides = vec![
            Ide {
                name: "code".to_string(),
                shortcut: "code".to_string(),
            },
            Ide {
                name: "zed".to_string(),
                shortcut: "zed".to_string(),
            },
        ];
        let editor = EditorState::new();
        cycle_preferred_ide(&mut app, &editor);
        assert_eq!(app.config.entries[0].preferred_ide.as_deref(), Some("code"));
        cycle_preferred_ide(&mut app, &editor);
        assert_eq!(app.config.entries[0].preferred_ide.as_deref(), Some("zed"));
        cycle_preferred_ide(&mut app, &editor);
        assert_eq!(app.config.entries[0].preferred_ide, None);
    }
}

//! Keystroke dispatch, keyed by the active mode.
//!
//! Each mode handler takes the mode's sub-state by value and returns the
//! next mode together with a [`KeyAction`] for the event loop, so every
//! transition table can be tested without a terminal. Blocking work (scans,
//! fetch, push) is returned as an action rather than performed here, letting
//! the loop draw a busy frame first.

mod config;
mod entries_edit;
mod main_menu;
mod remote;

pub use config::discovered_sorted;

use crossterm::event::KeyEvent;

use crate::app::{App, Mode};
use crate::launch::LaunchPlan;

/// What the event loop should do after a keystroke.
pub enum KeyAction {
    Continue,
    Quit,
    /// Foreground launch: restore the terminal, run, exit with its status.
    Launch(LaunchPlan),
    /// Blocking operations, run by the loop behind a busy indicator.
    ScanDiffs,
    ScanRepos,
    FetchAll,
    PushAll,
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    // The active mode is moved out for the duration of the dispatch so the
    // handler can borrow the rest of App freely; it puts a mode back via the
    // return value.
    let mode = std::mem::replace(&mut app.mode, Mode::Main);
    let (next, action) = match mode {
        Mode::Main => main_menu::handle(app, key),
        Mode::ConfigMenu { selected } => config::handle_menu(app, selected, key),
        Mode::EntriesEdit(editor) => entries_edit::handle(app, editor, key),
        Mode::Visibility(state) => config::handle_visibility(app, state, key),
        Mode::StartupModes(state) => config::handle_startup(app, state, key),
        Mode::Remote(state) => remote::handle(app, state, key),
        Mode::OtherManaged { selected } => remote::handle_other(app, selected, key),
        Mode::FirstRun => config::handle_first_run(app, key),
    };
    app.mode = next;
    action
}

/// Shared list-navigation step: clamped move within `len` rows.
pub(crate) fn step(selected: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if down {
        (selected + 1).min(len - 1)
    } else {
        selected.saturating_sub(1)
    }
}

//! Rendering: pure functions from `&App` to one whole frame.
//!
//! Every state change redraws the full screen: a one-line header, the
//! active mode's body, a key-help footer, and the expiring status line.

mod modal;
mod panels;
mod remote;
pub mod status;
mod tree;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, Mode};

use status::StatusLevel;

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, body, help, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header, app);
    draw_body(frame, body, app);
    draw_help(frame, help, app);
    draw_status(frame, status, app);

    if let Some(label) = &app.busy {
        draw_busy(frame, label);
    }
}

fn draw_body(frame: &mut Frame, area: Rect, app: &App) {
    match &app.mode {
        Mode::Main => tree::draw_tree(frame, area, app, app.selected, " repodeck "),
        Mode::ConfigMenu { selected } => panels::draw_config_menu(frame, area, *selected),
        Mode::EntriesEdit(editor) => {
            tree::draw_tree(frame, area, app, editor.selected, " Edit entries ");
            if let Some(m) = &editor.modal {
                modal::draw_editor_modal(frame, app, m);
            }
        }
        Mode::Visibility(state) => panels::draw_visibility(frame, area, app, state),
        Mode::StartupModes(state) => panels::draw_startup(frame, area, app, state),
        Mode::Remote(state) => remote::draw(frame, area, app, state),
        Mode::OtherManaged { selected } => panels::draw_other_managed(frame, area, app, *selected),
        Mode::FirstRun => {
            tree::draw_tree(frame, area, app, app.selected, " repodeck ");
            modal::draw_first_run(frame);
        }
    }
}

/// Title, current run and startup modes, cache ages.
fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "repodeck",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  mode: "),
        Span::styled(
            app.current_run_mode_name().to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  startup: "),
        Span::styled(
            app.current_startup_mode().to_string(),
            Style::default().fg(Color::Yellow),
        ),
    ];
    if let Some(scan) = app.cache.diffs.last_scan {
        spans.push(Span::styled(
            format!("  diffs {}", scan.format("%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(fetch) = app.cache.remote_status.last_fetch {
        spans.push(Span::styled(
            format!("  fetched {}", fetch.format("%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let text = match &app.mode {
        Mode::Main => {
            "↑↓ navigate  ←→ fold  Enter launch  w new window  m mode  s startup  d diff scan  r remote  c config  o other  q quit"
        }
        Mode::ConfigMenu { .. } => "↑↓ navigate  Enter select  Esc back",
        Mode::EntriesEdit(editor) => match &editor.modal {
            None => {
                "↑↓ navigate  J/K move  a add  d delete  r rename  g group  u ungroup  n nest  t ide  Enter save  Esc cancel"
            }
            Some(_) => "↑↓ navigate  Enter confirm  Esc cancel",
        },
        Mode::Visibility(_) => "↑↓ navigate  Space toggle managed  Enter save  Esc cancel",
        Mode::StartupModes(state) => match state.editing {
            None => "↑↓ navigate  J/K move  a add  r rename  d delete  Enter save  Esc cancel",
            Some(_) => "type to edit  Enter confirm  Esc cancel",
        },
        Mode::Remote(state) => {
            if state.files.is_some() || state.report.is_some() {
                "Esc close"
            } else {
                "↑↓ navigate  f fetch all  p push ahead  Enter files  Esc back"
            }
        }
        Mode::OtherManaged { .. } => "↑↓ navigate  Enter launch  w new window  Esc back",
        Mode::FirstRun => "y create shortcut  n skip",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray))),
        area,
    );
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let Some((message, level)) = app.status.current() else {
        return;
    };
    let color = match level {
        StatusLevel::Info => Color::Gray,
        StatusLevel::Success => Color::Green,
        StatusLevel::Error => Color::Red,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(message.to_string(), Style::default().fg(color))),
        area,
    );
}

/// Centered overlay announcing a blocking operation in progress.
fn draw_busy(frame: &mut Frame, label: &str) {
    let area = centered_rect(frame.area(), (label.len() + 6) as u16, 3);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(label.to_string())
            .centered()
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// A rect of the given size centered in `area`, clamped to fit.
pub(crate) fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

//! Remote-status dashboard: one cached row per managed repository, plus an
//! optional changed-files panel for the selected row.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, RemoteState};
use crate::git::{AheadBehind, FileChange, PushSummary};

use super::centered_rect;

pub fn draw(frame: &mut Frame, area: Rect, app: &App, state: &RemoteState) {
    let rows: Vec<Row> = state
        .repos
        .iter()
        .map(|path| {
            let status = app.cache.remote_status.data.get(path);
            let diff = app
                .cache
                .diffs
                .data
                .get(path)
                .map_or_else(|| "-".to_string(), |d| {
                    format!("+{} -{}", d.lines_added, d.lines_removed)
                });
            Row::new(vec![
                path.clone(),
                status
                    .and_then(|s| s.branch.clone())
                    .unwrap_or_else(|| "-".to_string()),
                ahead_behind_cell(status.and_then(|s| s.upstream)),
                ahead_behind_cell(status.and_then(|s| s.main)),
                diff,
            ])
        })
        .collect();

    let title = match app.cache.remote_status.last_fetch {
        Some(at) => format!(" Remote status (as of {}) ", at.format("%m-%d %H:%M")),
        None => " Remote status (never fetched) ".to_string(),
    };
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["repository", "branch", "upstream", "main", "local"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title(title).borders(Borders::ALL))
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");
    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);

    if let Some((path, files)) = &state.files {
        draw_files_panel(frame, path, files);
    }
    if let Some(report) = &state.report {
        draw_push_report(frame, report);
    }
}

/// `-` when the comparison could not be computed; divergence is shown only
/// when non-zero so a clean row stays quiet.
fn ahead_behind_cell(ab: Option<AheadBehind>) -> String {
    match ab {
        None => "-".to_string(),
        Some(AheadBehind { ahead: 0, behind: 0 }) => "ok".to_string(),
        Some(ab) => format!("↑{} ↓{}", ab.ahead, ab.behind),
    }
}

/// Overlay height for a list of `rows`: clamped before the cast so very
/// large lists cannot wrap around `u16`.
fn panel_height(rows: usize) -> u16 {
    rows.saturating_add(2).min(20) as u16
}

fn draw_files_panel(frame: &mut Frame, path: &str, files: &[FileChange]) {
    let area = centered_rect(frame.area(), 60, panel_height(files.len()));
    let items: Vec<ListItem> = files
        .iter()
        .map(|change| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    change.status.clone(),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(" "),
                Span::raw(change.file.clone()),
            ]))
        })
        .collect();
    frame.render_widget(Clear, area);
    frame.render_widget(
        List::new(items).block(
            Block::default()
                .title(format!(" {path} "))
                .borders(Borders::ALL),
        ),
        area,
    );
}

/// Batch-push outcome: the headline plus one line per failed repository.
fn draw_push_report(frame: &mut Frame, report: &PushSummary) {
    let mut lines = vec![Line::from(Span::styled(
        report.headline(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (path, msg) in &report.errors {
        lines.push(Line::from(vec![
            Span::styled(path.clone(), Style::default().fg(Color::Yellow)),
            Span::raw(": "),
            Span::styled(msg.clone(), Style::default().fg(Color::Red)),
        ]));
    }
    let area = centered_rect(frame.area(), 70, panel_height(lines.len()));
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Push report ")
                .borders(Borders::ALL),
        ),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_height_clamps_before_narrowing() {
        assert_eq!(panel_height(0), 2);
        assert_eq!(panel_height(5), 7);
        assert_eq!(panel_height(18), 20);
        // Larger than u16::MAX: must clamp, not truncate.
        assert_eq!(panel_height(80_000), 20);
        assert_eq!(panel_height(usize::MAX), 20);
    }

    #[test]
    fn unknown_divergence_renders_as_a_dash() {
        assert_eq!(ahead_behind_cell(None), "-");
        assert_eq!(
            ahead_behind_cell(Some(AheadBehind { ahead: 0, behind: 0 })),
            "ok"
        );
        assert_eq!(
            ahead_behind_cell(Some(AheadBehind { ahead: 2, behind: 1 })),
            "↑2 ↓1"
        );
    }
}

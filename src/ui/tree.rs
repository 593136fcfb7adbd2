//! The entry tree list: indentation, fold glyphs, ide tags, and per-entry
//! or rolled-up diff stats from the cache.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::App;
use crate::entries::{self, Entry};
use crate::git::DiffTotals;

pub fn draw_tree(frame: &mut Frame, area: Rect, app: &App, selected: usize, title: &str) {
    let items: Vec<ListItem> = app
        .rows
        .iter()
        .filter_map(|row| {
            let entry = app.entry_at(&row.path)?;
            Some(ListItem::new(tree_line(app, entry, row.depth)))
        })
        .collect();

    if items.is_empty() {
        let empty = List::new(vec![ListItem::new(Span::styled(
            "No entries yet; press c to configure",
            Style::default().fg(Color::DarkGray),
        ))])
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn tree_line<'a>(app: &App, entry: &'a Entry, depth: usize) -> Line<'a> {
    let indent = "  ".repeat(depth);
    let glyph = if entry.is_group() {
        if entry.is_expanded {
            "▾ "
        } else {
            "▸ "
        }
    } else {
        "  "
    };
    let name_style = if entry.is_group() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::raw(indent),
        Span::raw(glyph),
        Span::styled(entry.display_name.clone(), name_style),
    ];
    if let Some(ide) = &entry.preferred_ide {
        spans.push(Span::styled(
            format!(" [{ide}]"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(stats) = entry_stats(app, entry) {
        spans.extend(stats_spans(&stats));
    }
    Line::from(spans)
}

/// Cached diff totals for the entry: its own for a repository, the
/// synthetic rollup for a group.
fn entry_stats(app: &App, entry: &Entry) -> Option<DiffTotals> {
    let key = match entry.repository_path.as_deref() {
        Some(path) => path.to_string(),
        None => entries::group_stats_key(&entry.display_name),
    };
    app.cache.diffs.data.get(&key).copied()
}

pub(super) fn stats_spans(stats: &DiffTotals) -> Vec<Span<'static>> {
    vec![
        Span::styled(
            format!(" +{}", stats.lines_added),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!(" -{}", stats.lines_removed),
            Style::default().fg(Color::Red),
        ),
        Span::styled(
            format!(" ({} files)", stats.files_changed),
            Style::default().fg(Color::DarkGray),
        ),
    ]
}

//! Centered overlays: the entries-edit modals and the first-run prompt.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, EditorModal};

use super::centered_rect;

pub fn draw_editor_modal(frame: &mut Frame, app: &App, modal: &EditorModal) {
    match modal {
        EditorModal::AddEntry {
            candidates,
            selected,
        } => {
            let items = candidates.iter().map(|p| ListItem::new(p.as_str())).collect();
            picker(frame, " Add repository ", items, *selected);
        }
        EditorModal::Nest {
            targets, selected, ..
        } => {
            let items = targets
                .iter()
                .map(|target| {
                    let label = match target {
                        None => "(root)".to_string(),
                        Some(path) => app
                            .entry_at(path)
                            .map_or_else(|| "?".to_string(), |e| e.display_name.clone()),
                    };
                    ListItem::new(label)
                })
                .collect();
            picker(frame, " Nest under ", items, *selected);
        }
        EditorModal::GroupConfirm { prefix, count } => {
            confirm(
                frame,
                format!("Group {count} entries under \"{prefix}\"? (y/n)"),
            );
        }
        EditorModal::Rename { buffer } => {
            let area = centered_rect(frame.area(), 40, 3);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw(buffer.clone()),
                    Span::styled("▏", Style::default().fg(Color::Yellow)),
                ]))
                .block(Block::default().title(" Rename ").borders(Borders::ALL)),
                area,
            );
        }
    }
}

fn picker(frame: &mut Frame, title: &str, items: Vec<ListItem>, selected: usize) {
    let height = (items.len() as u16 + 2).min(16);
    let area = centered_rect(frame.area(), 50, height.max(3));
    let list = List::new(items)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_widget(Clear, area);
    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn confirm(frame: &mut Frame, question: String) {
    let area = centered_rect(frame.area(), (question.len() as u16 + 6).min(70), 3);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(question)
            .centered()
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

pub fn draw_first_run(frame: &mut Frame) {
    let area = centered_rect(frame.area(), 56, 4);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from("Create a desktop shortcut for repodeck?"),
            Line::from(Span::styled(
                "y yes   n no (asked only once)",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .centered()
        .block(Block::default().title(" Welcome ").borders(Borders::ALL)),
        area,
    );
}

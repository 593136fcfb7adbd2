//! Full-screen list bodies: config menu, repository visibility, startup
//! modes, and the other-managed submenu.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::{App, StartupEdit, StartupState, VisibilityState, CONFIG_MENU_ITEMS};
use crate::handlers::discovered_sorted;

fn selectable_list(frame: &mut Frame, area: Rect, title: &str, items: Vec<ListItem>, selected: usize) {
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

pub fn draw_config_menu(frame: &mut Frame, area: Rect, selected: usize) {
    let items = CONFIG_MENU_ITEMS
        .iter()
        .map(|item| ListItem::new(*item))
        .collect();
    selectable_list(frame, area, " Configuration ", items, selected);
}

/// Full discovered list with a managed/unmanaged marker per repository.
pub fn draw_visibility(frame: &mut Frame, area: Rect, app: &App, state: &VisibilityState) {
    let items: Vec<ListItem> = discovered_sorted(app)
        .into_iter()
        .map(|path| {
            let unmanaged = app.config.unmanaged_paths.contains(&path);
            let (mark, style) = if unmanaged {
                ("[ ] ", Style::default().fg(Color::DarkGray))
            } else {
                ("[x] ", Style::default())
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, style),
                Span::styled(path, style),
            ]))
        })
        .collect();
    selectable_list(frame, area, " Managed repositories ", items, state.selected);
}

pub fn draw_startup(frame: &mut Frame, area: Rect, app: &App, state: &StartupState) {
    let mut items: Vec<ListItem> = app
        .config
        .claude_startup_modes
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            // The row being renamed shows the live buffer with a cursor.
            if i == state.selected {
                if let Some(StartupEdit::Rename { buffer }) = &state.editing {
                    return ListItem::new(Line::from(vec![
                        Span::styled(buffer.clone(), Style::default().fg(Color::Yellow)),
                        Span::styled("▏", Style::default().fg(Color::Yellow)),
                    ]));
                }
            }
            ListItem::new(mode.as_str())
        })
        .collect();
    if let Some(StartupEdit::Add { buffer }) = &state.editing {
        items.push(ListItem::new(Line::from(vec![
            Span::styled("+ ", Style::default().fg(Color::Green)),
            Span::styled(buffer.clone(), Style::default().fg(Color::Yellow)),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])));
    }
    selectable_list(frame, area, " Startup modes ", items, state.selected);
}

pub fn draw_other_managed(frame: &mut Frame, area: Rect, app: &App, selected: usize) {
    let items: Vec<ListItem> = app
        .other_managed()
        .into_iter()
        .map(ListItem::new)
        .collect();
    selectable_list(frame, area, " Other managed repositories ", items, selected);
}

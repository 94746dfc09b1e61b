use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::app::{AppState, Theme};
use crate::model::{IndexPath, User};

fn user_item(user: &User, theme: &Theme) -> ListItem<'static> {
    let name = if user.name.trim().is_empty() { "(no name)".to_string() } else { user.name.clone() };
    let mut spans = vec![
        Span::styled(name, Style::default().fg(theme.text)),
        Span::styled(format!("  {}", user.id), Style::default().fg(theme.muted)),
    ];
    if !user.is_available() {
        spans.push(Span::styled("  (unavailable)", Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC)));
    }
    ListItem::new(Line::from(spans))
}

/// Render the sectioned list and remember which row ended up last on screen.
pub fn render_user_list(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(2) as usize;
    if body_height > 0 { app.rows_per_page = body_height; }

    let c = &app.controller;
    let searching = c.is_search_active();
    let mut items: Vec<ListItem<'static>> = Vec::new();
    // row behind each list line; `None` for section headers
    let mut lines: Vec<Option<IndexPath>> = Vec::new();
    let mut selected_line = None;
    let mut flat = 0usize;
    for s in 0..c.section_count() {
        if !searching {
            items.push(ListItem::new(Line::from(Span::styled(
                format!(" {}", c.section_title(s)),
                Style::default().fg(app.theme.section_fg).add_modifier(Modifier::BOLD),
            ))));
            lines.push(None);
        }
        for r in 0..c.row_count(s) {
            let Some(user) = c.row_content(s, r) else { continue };
            if flat == app.selected { selected_line = Some(items.len()); }
            items.push(user_item(user, &app.theme));
            lines.push(Some(IndexPath::new(s, r)));
            flat += 1;
        }
    }

    let title = if searching {
        format!("Results ({})", flat)
    } else {
        format!("Users ({} in {} sections)", flat, c.section_count())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    if items.is_empty() {
        let message = match (&app.empty_message, app.loading) {
            (_, true) => "Loading…".to_string(),
            (Some(m), false) => m.clone(),
            (None, false) => String::new(),
        };
        let p = Paragraph::new(message).style(Style::default().fg(app.theme.muted)).block(block);
        f.render_widget(p, area);
        app.last_visible = None;
        return;
    }

    app.list_state.select(selected_line);
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, area, &mut app.list_state);

    let offset = app.list_state.offset();
    let end = (offset + body_height).min(lines.len());
    app.last_visible = lines[offset.min(end)..end].iter().rev().find_map(|p| *p);
}

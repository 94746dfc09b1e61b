//! Shared UI components (status bar, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{Keymap, format_action};
use crate::app::{AppState, InputMode, ModalState};
use std::collections::{BTreeMap, BTreeSet};

/// Render the bottom status bar with mode, counts, fetch state and the last error.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let c = &app.controller;
    let mut msg = format!(
        "mode: {mode}  users:{}  sections:{}",
        c.grouped().user_count(),
        c.grouped().len()
    );
    if c.is_search_active() {
        msg.push_str(&format!("  results:{}", c.search().results().len()));
    }
    if app.loading {
        msg.push_str("  loading…");
    } else if c.is_exhausted() {
        msg.push_str("  (end of list)");
    }

    let mut spans = vec![Span::raw(msg)];
    if let Some(err) = &app.last_error {
        spans.push(Span::styled(
            format!("  error: {err}"),
            Style::default().fg(app.theme.error_fg).add_modifier(Modifier::BOLD),
        ));
    }
    let p = Paragraph::new(Line::from(spans)).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Placeholder for the conversation screen opened by selecting a user.
pub fn render_conversation_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Conversation { user } = state {
        let rect = centered_rect(48, 7, area);
        let text = vec![
            Line::from(Span::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(format!("id: {}", user.id), Style::default().fg(app.theme.muted))),
            Line::raw(""),
            Line::raw("Conversation opened. Esc to go back."),
        ];
        let p = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Conversation")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

/// Group bindings by action for display, keys sorted.
pub fn bindings_by_action(keymap: &Keymap) -> BTreeMap<&'static str, BTreeSet<String>> {
    let mut out: BTreeMap<&'static str, BTreeSet<String>> = BTreeMap::new();
    for ((mods, code), action) in keymap.all_bindings() {
        out.entry(format_action(action))
            .or_default()
            .insert(Keymap::format_key(mods, code));
    }
    out
}

/// Render the help modal listing the active key bindings.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 60u16.min(area.width.saturating_sub(4)).max(30);
    let height = area.height.saturating_sub(4).max(8);
    let rect = centered_rect(width, height, area);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("Key bindings", Style::default().add_modifier(Modifier::BOLD))),
        Line::raw(""),
    ];
    let grouped = bindings_by_action(&app.keymap);
    let label_w = grouped.keys().map(|k| k.len()).max().unwrap_or(0);
    for (action, keys) in grouped {
        let joined = keys.into_iter().collect::<Vec<_>>().join(", ");
        lines.push(Line::from(vec![
            Span::raw(format!("  {:>width$} │ ", action, width = label_w)),
            Span::styled(joined, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Search prompt",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::raw("  type to filter, Tab: available only, Enter: browse results, Esc: close"));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

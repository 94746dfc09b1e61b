pub mod components;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.area());

    render_header(f, root[0], app);
    users::render_user_list(f, root[1], app);
    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let c = &app.controller;
    let mut spans = vec![
        Span::styled(
            format!("{} ", c.session().name),
            Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" list:{} ", c.mode().label())),
    ];
    if c.search().session_open || app.input_mode == InputMode::Search {
        let cursor = if app.input_mode == InputMode::Search { "▏" } else { "" };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!(" Search: {}{} ", app.search_input, cursor),
            Style::default().fg(app.theme.search_fg).bg(app.theme.search_bg),
        ));
        spans.push(Span::raw(format!("  scope:{}", c.search().scope.label())));
    } else {
        spans.push(Span::styled(
            "  /: search  r: refresh  m: mode  ?: help  q: quit",
            Style::default().fg(app.theme.muted),
        ));
    }

    let p = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .title("userdir-tui")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    match &app.modal {
        Some(state @ ModalState::Conversation { .. }) => components::render_conversation_modal(f, area, app, state),
        Some(ModalState::Help { scroll }) => components::render_help_modal(f, area, app, *scroll),
        None => {}
    }
}

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState};
use crate::source::ListMode;
use crate::ui;

/// Whether the event loop should keep running after a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, mut app: AppState) -> Result<()> {
    app.controller.refresh();

    loop {
        app.sync();
        terminal.draw(|f| {
            ui::render(f, &mut app);
        })?;
        if let Some(pos) = app.last_visible.take() {
            app.controller.will_display_row(pos.section, pos.row);
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut app, key) == Flow::Quit {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Apply one key press to the application state.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Flow {
    match app.input_mode {
        InputMode::Normal => handle_normal(app, key),
        InputMode::Search => {
            handle_search(app, key);
            Flow::Continue
        }
        InputMode::Modal => {
            handle_modal(app, key);
            Flow::Continue
        }
    }
}

fn handle_normal(app: &mut AppState, key: KeyEvent) -> Flow {
    let Some(action) = app.keymap.resolve(&key) else {
        return Flow::Continue;
    };
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::StartSearch => {
            app.controller.begin_search();
            app.input_mode = InputMode::Search;
        }
        KeyAction::CancelSearch => {
            if app.controller.search().session_open {
                close_search(app);
            }
        }
        KeyAction::Refresh => {
            app.last_error = None;
            app.selected = 0;
            app.controller.refresh();
        }
        KeyAction::ToggleScope => toggle_scope(app),
        KeyAction::CycleMode => {
            let next = match app.controller.mode() {
                ListMode::All => ListMode::Friends,
                ListMode::Friends => ListMode::Disabled,
                ListMode::Disabled => ListMode::All,
            };
            app.selected = 0;
            app.controller.set_mode(next);
        }
        KeyAction::OpenHelp => {
            app.modal = Some(ModalState::Help { scroll: 0 });
            app.input_mode = InputMode::Modal;
        }
        KeyAction::Select => {
            if let Some(pos) = app.selected_position() {
                app.controller.on_row_selected(pos.section, pos.row);
            }
        }
        KeyAction::MoveUp => move_selection(app, -1),
        KeyAction::MoveDown => move_selection(app, 1),
        KeyAction::PageUp => move_selection(app, -(app.rows_per_page as isize)),
        KeyAction::PageDown => move_selection(app, app.rows_per_page as isize),
        KeyAction::Top => app.selected = 0,
        KeyAction::Bottom => app.selected = app.positions().len().saturating_sub(1),
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

fn handle_search(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => close_search(app),
        // Keep the results and go back to navigating them.
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Tab => toggle_scope(app),
        KeyCode::Up => move_selection(app, -1),
        KeyCode::Down => move_selection(app, 1),
        KeyCode::Backspace => {
            app.search_input.pop();
            update_query(app);
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            update_query(app);
        }
        _ => {}
    }
}

fn handle_modal(app: &mut AppState, key: KeyEvent) {
    if let Some(ModalState::Help { scroll }) = &mut app.modal {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                *scroll = scroll.saturating_add(1);
                return;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                *scroll = scroll.saturating_sub(1);
                return;
            }
            _ => {}
        }
    }
    if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
        app.modal = None;
        app.input_mode = InputMode::Normal;
    }
}

fn update_query(app: &mut AppState) {
    app.selected = 0;
    let query = app.search_input.clone();
    app.controller.set_search_query(&query);
}

fn close_search(app: &mut AppState) {
    app.search_input.clear();
    app.selected = 0;
    app.controller.end_search();
    app.input_mode = InputMode::Normal;
}

fn toggle_scope(app: &mut AppState) {
    let scope = app.controller.search().scope.toggled();
    app.controller.begin_search();
    app.selected = 0;
    app.controller.set_scope(scope);
}

fn move_selection(app: &mut AppState, delta: isize) {
    let len = app.positions().len();
    if len == 0 {
        app.selected = 0;
        return;
    }
    let next = app.selected as isize + delta;
    app.selected = next.clamp(0, len as isize - 1) as usize;
}

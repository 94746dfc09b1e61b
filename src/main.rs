//! userdir-tui binary entry point.
//!
//! Parses options, sets up file logging, initializes the terminal in raw mode,
//! runs the TUI event loop and restores the terminal state on exit.
//!
use anyhow::Context as _;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use userdir_tui::app::{self, cli::Cli};

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> anyhow::Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    app::cli::init_tracing(&cli)?;
    let state = app::cli::build_app(&cli);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, state);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err:#}");
    }
    Ok(())
}

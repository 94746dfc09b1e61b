//! Command line options and startup wiring.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use super::keymap::Keymap;
use super::{AppState, Theme};
use crate::controller::UserListController;
use crate::fetch::ThreadExecutor;
use crate::model::Session;
use crate::source::{ListMode, MemorySource};
use crate::sys::PasswdDirectory;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Local accounts from passwd/group files.
    Passwd,
    /// Built-in sample directory.
    Demo,
}

#[derive(Debug, Parser)]
#[command(name = "userdir-tui", version, about = "Browse and search a directory of chat users")]
pub struct Cli {
    /// Which users to list: all, friends or disabled.
    #[arg(long, env = "USERDIR_MODE", default_value = "all")]
    pub mode: ListMode,

    /// Users fetched per page.
    #[arg(long, env = "USERDIR_PAGE_SIZE")]
    pub page_size: Option<usize>,

    #[arg(long, value_enum, env = "USERDIR_SOURCE", default_value_t = SourceKind::Passwd)]
    pub source: SourceKind,

    #[arg(long, default_value = "/etc/passwd")]
    pub passwd: PathBuf,

    #[arg(long, default_value = "/etc/group")]
    pub group: PathBuf,

    /// Browse as this login instead of the current account.
    #[arg(long = "as", value_name = "LOGIN")]
    pub login: Option<String>,

    /// Theme file (key = #RRGGBB); created with defaults if missing.
    #[arg(long)]
    pub theme: Option<String>,

    /// Keybindings file (Action = Key); created with defaults if missing.
    #[arg(long)]
    pub keybinds: Option<String>,

    #[arg(long, env = "USERDIR_LOG", default_value = "userdir-tui.log")]
    pub log_file: PathBuf,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Send tracing output to the log file; the terminal belongs to the UI.
pub fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("invalid log filter '{}'", cli.log_level))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("opening log file {}", cli.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;
    Ok(())
}

/// The account the directory is browsed as.
pub fn resolve_session(cli: &Cli) -> Session {
    let login = cli.login.clone().unwrap_or_else(|| {
        users::get_current_username()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("uid{}", users::get_current_uid()))
    });
    Session::new(login.clone(), login)
}

pub fn build_controller(cli: &Cli, session: Session) -> UserListController {
    let controller = match cli.source {
        SourceKind::Passwd => {
            let dir = PasswdDirectory::new(&cli.passwd, &cli.group, session.id.clone());
            UserListController::new(session, dir, ThreadExecutor)
        }
        SourceKind::Demo => UserListController::new(session, MemorySource::demo(), ThreadExecutor),
    };
    let controller = controller.with_mode(cli.mode);
    match cli.page_size {
        Some(n) => controller.with_page_size(n),
        None => controller,
    }
}

pub fn build_app(cli: &Cli) -> AppState {
    let session = resolve_session(cli);
    tracing::info!(login = %session.id, source = ?cli.source, mode = cli.mode.label(), "starting");
    let controller = build_controller(cli, session);
    let theme = cli.theme.as_deref().map_or_else(Theme::mocha, Theme::load_or_init);
    let keymap = cli.keybinds.as_deref().map_or_else(Keymap::default, Keymap::load_or_init);
    AppState::new(controller, theme, keymap)
}

//! Application state types and entry glue.
//!
//! Wraps a [`UserListController`] with the terminal-side state: selection,
//! input mode, theme, key bindings and whatever the controller last asked the
//! screen to show.
//!
pub mod cli;
pub mod keymap;
pub mod update;

use ratatui::style::Color;
use ratatui::widgets::ListState;

use crate::controller::{ListEvent, UserListController};
use crate::error::{Context, Result};
use crate::model::{IndexPath, User};

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub section_fg: Color,
    pub search_fg: Color,
    pub search_bg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub error_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
}

const THEME_KEYS: [&str; 14] = [
    "text",
    "muted",
    "title",
    "border",
    "header_bg",
    "header_fg",
    "section_fg",
    "search_fg",
    "search_bg",
    "status_bg",
    "status_fg",
    "error_fg",
    "highlight_fg",
    "highlight_bg",
];

impl Theme {
    /// Plain terminal colors.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            section_fg: Color::DarkGray,
            search_fg: Color::White,
            search_bg: Color::DarkGray,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            error_fg: Color::Red,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            section_fg: Color::Rgb(0x93, 0x99, 0xb2),   // overlay2
            search_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            search_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            error_fg: Color::Rgb(0xf3, 0x8b, 0xa8),     // red
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut Color> {
        Some(match key {
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "title" => &mut self.title,
            "border" => &mut self.border,
            "header_bg" => &mut self.header_bg,
            "header_fg" => &mut self.header_fg,
            "section_fg" => &mut self.section_fg,
            "search_fg" => &mut self.search_fg,
            "search_bg" => &mut self.search_bg,
            "status_bg" => &mut self.status_bg,
            "status_fg" => &mut self.status_fg,
            "error_fg" => &mut self.error_fg,
            "highlight_fg" => &mut self.highlight_fg,
            "highlight_bg" => &mut self.highlight_bg,
            _ => return None,
        })
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).with_ctx(|| format!("reading theme {path}"))?;
        let mut theme = Self::mocha();

        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            match (Self::parse_color(val), theme.slot(key)) {
                (Some(color), Some(slot)) => *slot = color,
                _ => tracing::warn!(key, value = val, "ignoring theme entry"),
            }
        }

        Ok(theme)
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or special names: "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        None
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userdir-tui theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n");
        buf.push_str("# search_fg/search_bg style the search input\n\n");

        fn color_to_str(c: Color) -> String {
            match c {
                Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
                Color::Reset => "reset".to_string(),
                // best-effort hex for named colors
                Color::Black => "#000000".to_string(),
                Color::Red => "#FF0000".to_string(),
                Color::Green => "#00FF00".to_string(),
                Color::Yellow => "#FFFF00".to_string(),
                Color::Blue => "#0000FF".to_string(),
                Color::Magenta => "#FF00FF".to_string(),
                Color::Cyan => "#00FFFF".to_string(),
                Color::Gray => "#B3B3B3".to_string(),
                Color::DarkGray => "#4D4D4D".to_string(),
                Color::LightRed => "#FF6666".to_string(),
                Color::LightGreen => "#66FF66".to_string(),
                Color::LightYellow => "#FFFF66".to_string(),
                Color::LightBlue => "#6666FF".to_string(),
                Color::LightMagenta => "#FF66FF".to_string(),
                Color::LightCyan => "#66FFFF".to_string(),
                Color::White => "#FFFFFF".to_string(),
                Color::Indexed(i) => format!("index:{}", i),
            }
        }

        let mut copy = *self;
        for key in THEME_KEYS {
            if let Some(c) = copy.slot(key) {
                let _ = writeln!(&mut buf, "{} = {}", key, color_to_str(*c));
            }
        }

        std::fs::write(path, buf)
    }

    /// Ensure a config file exists; if missing, write one with the default theme and return it.
    /// If present, load from it; on read errors, return `mocha`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default theme");
                Self::mocha()
            });
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(error = %e, path, "could not write theme file");
        }
        t
    }
}

/// Modal dialogs.
#[derive(Clone, Debug)]
pub enum ModalState {
    /// Stand-in for the conversation screen opened on selection.
    Conversation { user: User },
    Help { scroll: u16 },
}

pub struct AppState {
    pub controller: UserListController,
    pub input_mode: InputMode,
    pub search_input: String,
    /// Index into [`AppState::positions`].
    pub selected: usize,
    pub list_state: ListState,
    pub rows_per_page: usize,
    pub theme: Theme,
    pub keymap: keymap::Keymap,
    pub modal: Option<ModalState>,
    pub empty_message: Option<String>,
    pub last_error: Option<String>,
    pub loading: bool,
    pub last_selection: Option<(User, IndexPath)>,
    /// Last list row drawn on screen, reported back to the controller.
    pub last_visible: Option<IndexPath>,
}

impl AppState {
    pub fn new(controller: UserListController, theme: Theme, keymap: keymap::Keymap) -> Self {
        Self {
            controller,
            input_mode: InputMode::Normal,
            search_input: String::new(),
            selected: 0,
            list_state: ListState::default(),
            rows_per_page: 10,
            theme,
            keymap,
            modal: None,
            empty_message: None,
            last_error: None,
            loading: false,
            last_selection: None,
            last_visible: None,
        }
    }

    /// Every row of the list in display order.
    pub fn positions(&self) -> Vec<IndexPath> {
        let c = &self.controller;
        (0..c.section_count())
            .flat_map(|s| (0..c.row_count(s)).map(move |r| IndexPath::new(s, r)))
            .collect()
    }

    pub fn selected_position(&self) -> Option<IndexPath> {
        self.positions().get(self.selected).copied()
    }

    pub fn selected_user(&self) -> Option<&User> {
        let pos = self.selected_position()?;
        self.controller.row_content(pos.section, pos.row)
    }

    pub fn clamp_selection(&mut self) {
        let len = self.positions().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Pull finished fetches into the list and react to the controller's events.
    pub fn sync(&mut self) {
        self.controller.process_completions();
        for event in self.controller.take_events() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ListEvent) {
        match event {
            ListEvent::Reload => self.clamp_selection(),
            ListEvent::ShowEmptyState(message) => self.empty_message = Some(message),
            ListEvent::ClearEmptyState => self.empty_message = None,
            ListEvent::Loading(on) => self.loading = on,
            ListEvent::ShowError(e) => self.last_error = Some(e.to_string()),
            ListEvent::UserSelected { user, position } => {
                tracing::info!(user = %user.id, section = position.section, row = position.row, "user selected");
                self.last_selection = Some((user, position));
            }
            ListEvent::OpenConversation(user) => {
                self.modal = Some(ModalState::Conversation { user });
                self.input_mode = InputMode::Modal;
            }
        }
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;

//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Bindings map `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s. An action
//! listed in the config file is bound to exactly the keys listed for it;
//! actions the file does not mention keep their defaults.

use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::{Context, Result, simple_error};

/// Semantic keyboard actions in normal mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Quit,
    /// Open the search prompt.
    StartSearch,
    /// Close the search session and return to the grouped list.
    CancelSearch,
    /// Drop the list and fetch it again from the first page.
    Refresh,
    /// Toggle the "available only" search scope.
    ToggleScope,
    /// Cycle between all users, friends and disabled.
    CycleMode,
    OpenHelp,
    /// Open a conversation with the selected user.
    Select,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Ignore,
}

const ACTIONS: [(&str, KeyAction); 15] = [
    ("Quit", KeyAction::Quit),
    ("StartSearch", KeyAction::StartSearch),
    ("CancelSearch", KeyAction::CancelSearch),
    ("Refresh", KeyAction::Refresh),
    ("ToggleScope", KeyAction::ToggleScope),
    ("CycleMode", KeyAction::CycleMode),
    ("OpenHelp", KeyAction::OpenHelp),
    ("Select", KeyAction::Select),
    ("MoveUp", KeyAction::MoveUp),
    ("MoveDown", KeyAction::MoveDown),
    ("PageUp", KeyAction::PageUp),
    ("PageDown", KeyAction::PageDown),
    ("Top", KeyAction::Top),
    ("Bottom", KeyAction::Bottom),
    ("Ignore", KeyAction::Ignore),
];

#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: std::collections::HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Default bindings: arrows and vim keys for movement, `/` search, `r` refresh.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = std::collections::HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Esc), KeyAction::CancelSearch);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refresh);
        bindings.insert((M::NONE, Tab), KeyAction::ToggleScope);
        bindings.insert((M::NONE, Char('m')), KeyAction::CycleMode);
        bindings.insert((M::NONE, Char('?')), KeyAction::OpenHelp);
        bindings.insert((M::NONE, Enter), KeyAction::Select);
        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        bindings.insert((M::NONE, Home), KeyAction::Top);
        bindings.insert((M::NONE, End), KeyAction::Bottom);
        bindings.insert((M::NONE, Char('g')), KeyAction::Top);
        // Shift+g arrives as 'G' with or without the SHIFT flag depending on the terminal
        bindings.insert((M::NONE, Char('G')), KeyAction::Bottom);
        bindings.insert((M::SHIFT, Char('G')), KeyAction::Bottom);
        Self { bindings }
    }

    /// Load bindings from `path`, writing a commented default file if it does not exist.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default keybindings");
                Self::default()
            });
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(error = %e, path, "could not write keybindings file");
        }
        km
    }

    /// Read `Action = KeySpec` lines. An action named in the file loses its
    /// default keys; actions the file never mentions keep them. Lines that do
    /// not parse are logged and skipped.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).with_ctx(|| format!("reading keybindings {path}"))?;
        Ok(Self::from_lines(&contents))
    }

    fn from_lines(contents: &str) -> Self {
        let mut map = Self::default();
        let mut rebound: HashSet<KeyAction> = HashSet::new();
        for (lineno, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_binding(line) {
                Ok((key, action)) => {
                    if rebound.insert(action) {
                        map.bindings.retain(|_, a| *a != action);
                    }
                    map.bindings.insert(key, action);
                }
                Err(e) => tracing::warn!(line = lineno + 1, error = %e, "skipping keybinding"),
            }
        }
        map
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userdir-tui keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>, one line per key\n");
        buf.push_str("# Listing an action replaces its default keys; unlisted actions keep theirs\n");
        buf.push_str("# KeySpec examples: q, Ctrl+c, Enter, Esc, Tab, Up, Down, PageUp, PageDown, Home, End, /, r\n");
        let names: Vec<&str> = ACTIONS.iter().map(|(n, _)| *n).collect();
        let _ = writeln!(&mut buf, "# Actions: {}\n", names.join(", "));

        let mut rows: Vec<(&str, String)> = self
            .bindings
            .iter()
            .map(|((mods, code), action)| (format_action(*action), Self::format_key(*mods, *code)))
            .collect();
        rows.sort();
        for (action, key) in rows {
            let _ = writeln!(&mut buf, "{} = {}", action, key);
        }

        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Snapshot of all bindings as ((modifiers, code), action) pairs.
    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Format a key (modifiers + code) into a spec like "Ctrl+c" or "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Home => "Home".to_string(),
            End => "End".to_string(),
            Delete => "Delete".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_binding(line: &str) -> Result<((KeyModifiers, KeyCode), KeyAction)> {
    let (lhs, rhs) = line
        .split_once('=')
        .ok_or_else(|| simple_error(format!("missing '=' in '{line}'")))?;
    let action = parse_action(lhs).ok_or_else(|| simple_error(format!("unknown action '{}'", lhs.trim())))?;
    let key = parse_key(rhs).ok_or_else(|| simple_error(format!("unknown key '{}'", rhs.trim())))?;
    Ok((key, action))
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Home" => Home,
        "End" => End,
        "Delete" => Delete,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    ACTIONS.iter().find(|(name, _)| *name == s).map(|(_, a)| *a)
}

pub fn format_action(a: KeyAction) -> &'static str {
    ACTIONS
        .iter()
        .find(|(_, action)| *action == a)
        .map(|(name, _)| *name)
        .unwrap_or("Ignore")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn key(code: KeyCode, mods: KeyModifiers) -> KeyEvent {
		KeyEvent::new(code, mods)
	}

	#[test]
	fn defaults_resolve() {
		let km = Keymap::default();
		assert_eq!(km.resolve(&key(KeyCode::Char('/'), KeyModifiers::NONE)), Some(KeyAction::StartSearch));
		assert_eq!(km.resolve(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(KeyAction::Quit));
		assert_eq!(km.resolve(&key(KeyCode::F(5), KeyModifiers::NONE)), None);
	}

	#[test]
	fn binding_lines_parse() {
		assert_eq!(
			parse_binding("Refresh = Ctrl+r").unwrap(),
			((KeyModifiers::CONTROL, KeyCode::Char('r')), KeyAction::Refresh)
		);
		assert_eq!(
			parse_binding("Bottom=End").unwrap(),
			((KeyModifiers::NONE, KeyCode::End), KeyAction::Bottom)
		);
		assert!(parse_binding("Explode = x").is_err());
		assert!(parse_binding("Quit = Hyper+x").is_err());
		assert!(parse_binding("Quit").is_err());
	}

	#[test]
	fn rebinding_an_action_drops_its_default_keys() {
		let km = Keymap::from_lines("Refresh = x\nRefresh = Ctrl+r\nbogus line\n");
		assert_eq!(km.resolve(&key(KeyCode::Char('x'), KeyModifiers::NONE)), Some(KeyAction::Refresh));
		assert_eq!(km.resolve(&key(KeyCode::Char('r'), KeyModifiers::CONTROL)), Some(KeyAction::Refresh));
		assert_eq!(km.resolve(&key(KeyCode::Char('r'), KeyModifiers::NONE)), None);
		// untouched actions keep every default key
		assert_eq!(km.resolve(&key(KeyCode::Char('q'), KeyModifiers::NONE)), Some(KeyAction::Quit));
	}

	#[test]
	fn action_names_round_trip() {
		for (name, action) in ACTIONS {
			assert_eq!(parse_action(name), Some(action));
			assert_eq!(format_action(action), name);
		}
	}
}

/// Keyboard input: crossterm key events mapped to play commands.
///
/// The game is turn-based, so input is edge-triggered only: one key press
/// is one command. Key repeat events count as presses (holding an arrow
/// walks), release events are ignored.
///
/// Bindings come from `[keys]` in `config.toml`; unknown key names are
/// skipped with a warning so a typo never locks the player out.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::warn;

use hellgrid::Direction;

use crate::config::KeyConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Restart,
    Undo,
    NextLevel,
    PrevLevel,
    Save,
    Quit,
}

pub struct KeyMap {
    bindings: Vec<(KeyCode, Command)>,
}

impl KeyMap {
    pub fn from_config(keys: &KeyConfig) -> Self {
        let groups: [(&[String], Command); 10] = [
            (keys.up.as_slice(), Command::Move(Direction::Up)),
            (keys.right.as_slice(), Command::Move(Direction::Right)),
            (keys.down.as_slice(), Command::Move(Direction::Down)),
            (keys.left.as_slice(), Command::Move(Direction::Left)),
            (keys.restart.as_slice(), Command::Restart),
            (keys.undo.as_slice(), Command::Undo),
            (keys.next_level.as_slice(), Command::NextLevel),
            (keys.prev_level.as_slice(), Command::PrevLevel),
            (keys.save.as_slice(), Command::Save),
            (keys.quit.as_slice(), Command::Quit),
        ];

        let mut bindings = Vec::with_capacity(32);
        for (names, command) in groups {
            for name in names {
                match parse_key(name) {
                    Some(code) => bindings.push((code, command)),
                    None => warn!(key = %name, ?command, "unknown key name in config, ignored"),
                }
            }
        }
        KeyMap { bindings }
    }

    /// Command bound to `key`. Ctrl+C always quits.
    pub fn lookup(&self, key: KeyEvent) -> Option<Command> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Some(Command::Quit);
        }
        let code = normalize(key.code);
        self.bindings.iter().find(|(bound, _)| *bound == code).map(|(_, cmd)| *cmd)
    }

    /// First key name bound to `command`, for the help line.
    pub fn label(&self, command: Command) -> String {
        self.bindings
            .iter()
            .find(|(_, cmd)| *cmd == command)
            .map(|(code, _)| key_label(*code))
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Wait up to `timeout` for the next bound command.
pub fn next_command(keymap: &KeyMap, timeout: Duration) -> std::io::Result<Option<Command>> {
    if !poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) => Ok(keymap.lookup(key)),
        _ => Ok(None),
    }
}

/// Parse a config key name. Single characters are matched case-insensitively.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let name = name.trim();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(normalize(KeyCode::Char(c)));
    }
    let code = match name.to_ascii_lowercase().as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "space" => KeyCode::Char(' '),
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "delete" | "del" => KeyCode::Delete,
        f if f.starts_with('f') => KeyCode::F(f[1..].parse().ok()?),
        _ => return None,
    };
    Some(code)
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Left => "←".to_string(),
        KeyCode::Right => "→".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

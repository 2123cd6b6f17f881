/// Keyboard input: terminal key events -> player actions.
///
/// The puzzle is turn-based, so every Press (or Repeat) is one action;
/// nothing is tracked as held. Release events are ignored.
///
/// Movement is fixed to arrows and WASD. Undo, reset and menu keys come
/// from `[controls]` in config.toml and are matched case-insensitively.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::ControlsConfig;
use crate::domain::position::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Move(Direction),
    Undo,
    Reset,
    Menu,
    Confirm,
    LevelSelect,
    PageUp,
    PageDown,
    Quit,
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_LEVEL_SELECT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::F(4)];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q')];

pub struct KeyMap {
    undo: Vec<KeyCode>,
    reset: Vec<KeyCode>,
    menu: Vec<KeyCode>,
}

impl KeyMap {
    pub fn from_config(controls: &ControlsConfig) -> Self {
        KeyMap {
            undo: resolve_names(&controls.undo),
            reset: resolve_names(&controls.reset),
            menu: resolve_names(&controls.menu),
        }
    }

    /// Translate one key event. Configured keys win over the fixed ones.
    pub fn action_for(&self, key: KeyEvent) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Some(Action::Quit);
        }

        let code = normalize(key.code);
        let action = if self.undo.contains(&code) {
            Action::Undo
        } else if self.reset.contains(&code) {
            Action::Reset
        } else if self.menu.contains(&code) {
            Action::Menu
        } else if KEYS_UP.contains(&code) {
            Action::Move(Direction::Up)
        } else if KEYS_DOWN.contains(&code) {
            Action::Move(Direction::Down)
        } else if KEYS_LEFT.contains(&code) {
            Action::Move(Direction::Left)
        } else if KEYS_RIGHT.contains(&code) {
            Action::Move(Direction::Right)
        } else if KEYS_CONFIRM.contains(&code) {
            Action::Confirm
        } else if KEYS_LEVEL_SELECT.contains(&code) {
            Action::LevelSelect
        } else if KEYS_QUIT.contains(&code) {
            Action::Quit
        } else if code == KeyCode::PageUp {
            Action::PageUp
        } else if code == KeyCode::PageDown {
            Action::PageDown
        } else {
            return None;
        };
        Some(action)
    }

    /// Wait up to `timeout` for the next mapped key.
    pub fn next_action(&self, timeout: Duration) -> std::io::Result<Option<Action>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(self.action_for(key)),
            _ => Ok(None),
        }
    }
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

fn resolve_names(names: &[String]) -> Vec<KeyCode> {
    names
        .iter()
        .filter_map(|name| {
            let code = key_from_name(name);
            if code.is_none() {
                log::warn!("unknown key name in [controls]: {:?}", name);
            }
            code
        })
        .collect()
}

/// Key names as written in config.toml: a single character, `Esc`,
/// `Enter`, `Space`, `Tab`, `Backspace`, `Delete`, `Home`, `End` or `F1`..`F12`.
pub fn key_from_name(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c.to_ascii_lowercase()));
    }
    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "space" => KeyCode::Char(' '),
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        _ => {
            let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
            if (1..=12).contains(&n) {
                KeyCode::F(n)
            } else {
                return None;
            }
        }
    };
    Some(code)
}

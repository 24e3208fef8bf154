use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::status::GameStatus;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
}

impl KeyCode {
    /// Parses names such as `Left`, `ArrowLeft`, `Space` or `a`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        if ch.is_ascii_alphabetic() {
            return Some(Self::Character(ch.to_ascii_uppercase()));
        }
        if let Some(digit) = ch.to_digit(10) {
            return Some(Self::Digit(digit as u8));
        }
        None
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" | " " => Space,
        "Enter" | "Return" => Enter,
        "Left" | "ArrowLeft" => Left,
        "Right" | "ArrowRight" => Right,
        "Up" | "ArrowUp" => Up,
        "Down" | "ArrowDown" => Down,
        "Escape" | "Esc" => Escape,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the keys the game can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Escape,
}

/// Set of keys currently held, shared between the event source and the game.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press. Returns `false` when the key was already held.
    pub fn set_key_down(&self, key: KeyCode) -> bool {
        self.keys.write().insert(key)
    }

    /// Records a release. Returns `false` when the key was not held.
    pub fn set_key_up(&self, key: KeyCode) -> bool {
        self.keys.write().remove(&key)
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }
}

/// What a key event asks the player controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Run,
    Stop,
}

/// Translates press/release of the advance key into player commands.
///
/// Presses only count while the game is running. Releases are honoured in any
/// status except `Over`, so a player can always let go before the start.
#[derive(Debug, Clone)]
pub struct InputBridge {
    advance: KeyCode,
    held: Arc<InputState>,
}

impl InputBridge {
    pub fn new(advance: KeyCode, held: Arc<InputState>) -> Self {
        Self { advance, held }
    }

    pub fn advance_key(&self) -> KeyCode {
        self.advance
    }

    pub fn input_state(&self) -> &Arc<InputState> {
        &self.held
    }

    pub fn press(&self, key: KeyCode, status: GameStatus) -> Option<PlayerCommand> {
        self.held.set_key_down(key);
        if key != self.advance || status != GameStatus::Started {
            return None;
        }
        Some(PlayerCommand::Run)
    }

    pub fn release(&self, key: KeyCode, status: GameStatus) -> Option<PlayerCommand> {
        self.held.set_key_up(key);
        if key != self.advance || status == GameStatus::Over {
            return None;
        }
        Some(PlayerCommand::Stop)
    }
}

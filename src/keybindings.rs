//! Keyboard shortcuts for pairmark.
//!
//! Arrow keys navigate between sequences; single letters drive the
//! annotation tools. Bindings can be overridden in the configuration file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::message::{Command, CommandError};

/// A key press delivered by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    /// A printable character, stored lowercase
    Char(char),
}

impl FromStr for Key {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ArrowLeft" | "left" => return Ok(Key::ArrowLeft),
            "ArrowRight" | "right" => return Ok(Key::ArrowRight),
            _ => {}
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => Ok(Key::Char(c.to_ascii_lowercase())),
            _ => Err(CommandError::InvalidArgument {
                command: "key".to_string(),
                value: s.to_string(),
                expected: "ArrowLeft, ArrowRight or a single character",
            }),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = CommandError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::ArrowLeft => f.write_str("ArrowLeft"),
            Key::ArrowRight => f.write_str("ArrowRight"),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Actions that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Previous,
    Next,
    Occluded,
    Undo,
    ToggleCategory,
}

impl KeyAction {
    pub fn all() -> &'static [KeyAction] {
        &[
            KeyAction::Previous,
            KeyAction::Next,
            KeyAction::Occluded,
            KeyAction::Undo,
            KeyAction::ToggleCategory,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            KeyAction::Previous => "Previous sequence",
            KeyAction::Next => "Next sequence",
            KeyAction::Occluded => "Occluded mode",
            KeyAction::Undo => "Undo",
            KeyAction::ToggleCategory => "Toggle category",
        }
    }

    /// The command this action triggers.
    pub fn command(&self) -> Command {
        match self {
            KeyAction::Previous => Command::Previous,
            KeyAction::Next => Command::Next,
            KeyAction::Occluded => Command::ArmOccluded,
            KeyAction::Undo => Command::Undo,
            KeyAction::ToggleCategory => Command::Category(None),
        }
    }
}

/// Keybinding configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub previous: Key,
    pub next: Key,
    pub occluded: Key,
    pub undo: Key,
    pub toggle_category: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            previous: Key::ArrowLeft,
            next: Key::ArrowRight,
            occluded: Key::Char('o'),
            undo: Key::Char('z'),
            toggle_category: Key::Char('c'),
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action bound to a key, if any.
    pub fn action_for_key(&self, key: Key) -> Option<KeyAction> {
        KeyAction::all()
            .iter()
            .copied()
            .find(|action| self.key_for(*action) == key)
    }

    /// Get the command triggered by a key press, if any.
    pub fn command_for_key(&self, key: Key) -> Option<Command> {
        self.action_for_key(key).map(|action| action.command())
    }

    pub fn key_for(&self, action: KeyAction) -> Key {
        match action {
            KeyAction::Previous => self.previous,
            KeyAction::Next => self.next,
            KeyAction::Occluded => self.occluded,
            KeyAction::Undo => self.undo,
            KeyAction::ToggleCategory => self.toggle_category,
        }
    }

    pub fn set_key(&mut self, action: KeyAction, key: Key) {
        match action {
            KeyAction::Previous => self.previous = key,
            KeyAction::Next => self.next = key,
            KeyAction::Occluded => self.occluded = key,
            KeyAction::Undo => self.undo = key,
            KeyAction::ToggleCategory => self.toggle_category = key,
        }
    }

    /// Check if a key is already used by an action other than `exclude`.
    /// Returns the name of the conflicting action.
    pub fn key_conflict(&self, key: Key, exclude: Option<KeyAction>) -> Option<&'static str> {
        KeyAction::all()
            .iter()
            .filter(|action| Some(**action) != exclude)
            .find(|action| self.key_for(**action) == key)
            .map(|action| action.name())
    }

    /// First pair of actions sharing a key, if any.
    pub fn find_conflict(&self) -> Option<(Key, KeyAction, KeyAction)> {
        let actions = KeyAction::all();
        for (i, first) in actions.iter().enumerate() {
            for second in &actions[i + 1..] {
                if self.key_for(*first) == self.key_for(*second) {
                    return Some((self.key_for(*first), *first, *second));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.command_for_key(Key::ArrowLeft), Some(Command::Previous));
        assert_eq!(bindings.command_for_key(Key::ArrowRight), Some(Command::Next));
        assert_eq!(bindings.command_for_key(Key::Char('o')), Some(Command::ArmOccluded));
        assert_eq!(bindings.command_for_key(Key::Char('z')), Some(Command::Undo));
        assert_eq!(bindings.command_for_key(Key::Char('c')), Some(Command::Category(None)));
        assert_eq!(bindings.command_for_key(Key::Char('q')), None);
        assert!(bindings.find_conflict().is_none());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!("ArrowLeft".parse::<Key>().unwrap(), Key::ArrowLeft);
        assert_eq!("right".parse::<Key>().unwrap(), Key::ArrowRight);
        assert_eq!("O".parse::<Key>().unwrap(), Key::Char('o'));
        assert!("Enter".parse::<Key>().is_err());
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn test_key_serializes_as_string() {
        let json = serde_json::to_string(&KeyBindings::default()).unwrap();
        assert!(json.contains("\"previous\":\"ArrowLeft\""));
        assert!(json.contains("\"undo\":\"z\""));
        let back: KeyBindings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, KeyBindings::default());
    }

    #[test]
    fn test_key_conflict() {
        let mut bindings = KeyBindings::default();
        assert_eq!(bindings.key_conflict(Key::Char('z'), None), Some("Undo"));
        assert_eq!(bindings.key_conflict(Key::Char('z'), Some(KeyAction::Undo)), None);

        bindings.set_key(KeyAction::Occluded, Key::Char('z'));
        let (key, first, second) = bindings.find_conflict().unwrap();
        assert_eq!(key, Key::Char('z'));
        assert_eq!((first, second), (KeyAction::Occluded, KeyAction::Undo));
    }
}

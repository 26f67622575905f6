use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::command::{Command, Direction};

/// Keys the session can be driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Z,
    C,
    Minus,
    Equals,
    F3,
    F5,
    F9,
}

/// A key name that does not match any [`Key`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    /// Case-insensitive; `-`/`minus` and `=`/`equals` are both accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.to_ascii_lowercase().as_str() {
            "w" => Key::W,
            "a" => Key::A,
            "s" => Key::S,
            "d" => Key::D,
            "q" => Key::Q,
            "e" => Key::E,
            "z" => Key::Z,
            "c" => Key::C,
            "-" | "minus" => Key::Minus,
            "=" | "equals" => Key::Equals,
            "f3" => Key::F3,
            "f5" => Key::F5,
            "f9" => Key::F9,
            _ => return Err(UnknownKey(s.to_string())),
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::Minus => "-",
            Key::Equals => "=",
            other => return write!(f, "{other:?}"),
        };
        f.write_str(name)
    }
}

/// Parse a whitespace or comma separated key script, e.g. `"d d s = f3"`.
pub fn parse_keys(script: &str) -> Result<Vec<Key>, UnknownKey> {
    script
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .collect()
}

/// Key to command bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    bindings: BTreeMap<Key, Command>,
}

impl KeyMap {
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Bind `key`, returning the command it was bound to before.
    pub fn bind(&mut self, key: Key, command: Command) -> Option<Command> {
        self.bindings.insert(key, command)
    }

    /// Command bound to `key`, if any.
    pub fn command(&self, key: Key) -> Option<Command> {
        self.bindings.get(&key).copied()
    }

    pub fn bindings(&self) -> impl Iterator<Item = (Key, Command)> + '_ {
        self.bindings.iter().map(|(k, c)| (*k, *c))
    }
}

/// WASD plus QEZC diagonals, `-`/`=` zoom, F3 overlay, F5 save, F9 load.
impl Default for KeyMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (key, dir) in [
            (Key::W, Direction::North),
            (Key::E, Direction::NorthEast),
            (Key::D, Direction::East),
            (Key::C, Direction::SouthEast),
            (Key::S, Direction::South),
            (Key::Z, Direction::SouthWest),
            (Key::A, Direction::West),
            (Key::Q, Direction::NorthWest),
        ] {
            map.bind(key, Command::Move(dir));
        }
        map.bind(Key::Minus, Command::ZoomOut);
        map.bind(Key::Equals, Command::ZoomIn);
        map.bind(Key::F3, Command::ToggleOverlay);
        map.bind(Key::F5, Command::Save);
        map.bind(Key::F9, Command::Load);
        map
    }
}

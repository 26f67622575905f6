//! Interactive control: key bindings, commands, and the session that turns
//! commands into world changes and rendered frames.
//!
//! # Invariants
//! - The world is only changed through commands; keys never reach it.
//! - Refused moves leave the world and the view untouched.
//! - Loading a world always drops every cached surface of the old one.

mod command;
mod keymap;
mod session;

pub use command::{Command, Direction};
pub use keymap::{Key, KeyMap, UnknownKey, parse_keys};
pub use session::{Session, SessionConfig, SessionError};

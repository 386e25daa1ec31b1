//! Key press types.
//!
//! Bindings are keyed by [`KeyPress::name`], a stable human readable form
//! (`a`, `Enter`, `Ctrl-Q`, `F5`) that plugins and the `keybind` command
//! use as well.

mod modifiers;

use std::fmt;

pub use modifiers::Modifiers;
use serde::{Deserialize, Serialize};

/// Key identity without modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
	Char(char),
	Enter,
	Esc,
	Backspace,
	Tab,
	Delete,
	Up,
	Down,
	Left,
	Right,
	Home,
	End,
	PageUp,
	PageDown,
	F(u8),
}

/// A single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPress {
	pub code: KeyCode,
	pub modifiers: Modifiers,
}

impl KeyPress {
	pub const fn new(code: KeyCode) -> Self {
		Self {
			code,
			modifiers: Modifiers::NONE,
		}
	}

	pub const fn char(c: char) -> Self {
		Self::new(KeyCode::Char(c))
	}

	pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
		self.modifiers = modifiers;
		self
	}

	/// Returns the printable character for an unmodified char key.
	pub fn printable(&self) -> Option<char> {
		match self.code {
			KeyCode::Char(c) if !self.modifiers.ctrl && !self.modifiers.alt => Some(c),
			_ => None,
		}
	}

	/// Binding name of this key press.
	pub fn name(&self) -> String {
		let base = match self.code {
			KeyCode::Char(' ') => "Space".to_string(),
			KeyCode::Char(c) if self.modifiers.ctrl || self.modifiers.alt => c.to_ascii_uppercase().to_string(),
			KeyCode::Char(c) => return c.to_string(),
			KeyCode::Enter => "Enter".to_string(),
			KeyCode::Esc => "Escape".to_string(),
			KeyCode::Backspace => "Backspace".to_string(),
			KeyCode::Tab => "Tab".to_string(),
			KeyCode::Delete => "Delete".to_string(),
			KeyCode::Up => "Up".to_string(),
			KeyCode::Down => "Down".to_string(),
			KeyCode::Left => "Left".to_string(),
			KeyCode::Right => "Right".to_string(),
			KeyCode::Home => "Home".to_string(),
			KeyCode::End => "End".to_string(),
			KeyCode::PageUp => "PageUp".to_string(),
			KeyCode::PageDown => "PageDown".to_string(),
			KeyCode::F(n) => format!("F{n}"),
		};
		format!("{}{base}", self.modifiers.name_prefix())
	}
}

impl fmt::Display for KeyPress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_chars_name_themselves() {
		assert_eq!(KeyPress::char('a').name(), "a");
		assert_eq!(KeyPress::char(':').name(), ":");
	}

	#[test]
	fn modified_chars_are_uppercased_with_prefix() {
		let key = KeyPress::char('q').with_modifiers(Modifiers::CTRL);
		assert_eq!(key.name(), "Ctrl-Q");
		assert_eq!(key.printable(), None);
	}

	#[test]
	fn named_keys() {
		assert_eq!(KeyPress::new(KeyCode::Enter).name(), "Enter");
		assert_eq!(KeyPress::new(KeyCode::F(5)).name(), "F5");
		assert_eq!(KeyPress::char(' ').name(), "Space");
	}
}

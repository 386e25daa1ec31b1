//! Per-view key bindings.

use std::collections::HashMap;

use kiln_primitives::KeyboardMode;

/// Binding table of one view: `(mode, key name) -> command line`.
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
	bindings: HashMap<(KeyboardMode, String), String>,
}

impl KeyBindings {
	/// Binds `key` in `mode`. Returns true if the key was unbound.
	pub fn bind(&mut self, mode: KeyboardMode, key: impl Into<String>, command: impl Into<String>) -> bool {
		self.bindings.insert((mode, key.into()), command.into()).is_none()
	}

	pub fn get(&self, mode: KeyboardMode, key: &str) -> Option<&str> {
		self.bindings.get(&(mode, key.to_string())).map(String::as_str)
	}

	/// The binding for `key` in `mode`, falling back to [`KeyboardMode::All`].
	pub fn resolve(&self, mode: KeyboardMode, key: &str) -> Option<&str> {
		self.get(mode, key).or_else(|| self.get(KeyboardMode::All, key))
	}

	pub fn len(&self) -> usize {
		self.bindings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bindings.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mode_table_wins_over_all() {
		let mut keys = KeyBindings::default();
		assert!(keys.bind(KeyboardMode::All, "Ctrl-Q", "quit"));
		assert!(keys.bind(KeyboardMode::Edit, "Ctrl-Q", "alert nope"));

		assert_eq!(keys.resolve(KeyboardMode::Edit, "Ctrl-Q"), Some("alert nope"));
		assert_eq!(keys.resolve(KeyboardMode::Command, "Ctrl-Q"), Some("quit"));
		assert_eq!(keys.resolve(KeyboardMode::Command, "x"), None);
	}

	#[test]
	fn rebinding_replaces() {
		let mut keys = KeyBindings::default();
		keys.bind(KeyboardMode::Edit, ":", "show_command_window");
		assert!(!keys.bind(KeyboardMode::Edit, ":", "quit"));
		assert_eq!(keys.get(KeyboardMode::Edit, ":"), Some("quit"));
		assert_eq!(keys.len(), 1);
	}
}

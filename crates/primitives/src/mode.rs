use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Keyboard mode of the editor.
///
/// `All` is only meaningful for key bindings: a binding in `All` applies
/// whatever the current mode is, after the mode-specific table was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardMode {
	/// Keys resolve through bindings only.
	#[default]
	Edit,
	/// Printable keys are appended to the pending command line.
	Command,
	/// Binding wildcard.
	All,
}

impl KeyboardMode {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Edit => "edit",
			Self::Command => "command",
			Self::All => "all",
		}
	}
}

impl fmt::Display for KeyboardMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for KeyboardMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"edit" => Ok(Self::Edit),
			"command" => Ok(Self::Command),
			"all" => Ok(Self::All),
			other => Err(format!("unknown keyboard mode: {other}")),
		}
	}
}

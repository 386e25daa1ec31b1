//! Key modifier flags.

use serde::{Deserialize, Serialize};

/// Key modifiers (Ctrl, Alt, Shift).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers {
	pub ctrl: bool,
	pub alt: bool,
	pub shift: bool,
}

impl Modifiers {
	pub const NONE: Self = Self {
		ctrl: false,
		alt: false,
		shift: false,
	};

	pub const CTRL: Self = Self {
		ctrl: true,
		alt: false,
		shift: false,
	};

	pub const ALT: Self = Self {
		ctrl: false,
		alt: true,
		shift: false,
	};

	/// Returns true if no modifiers are set.
	pub fn is_empty(self) -> bool {
		!self.ctrl && !self.alt && !self.shift
	}

	/// Prefix used in binding names, e.g. `Ctrl-Alt-`.
	pub(crate) fn name_prefix(self) -> String {
		let mut out = String::new();
		if self.ctrl {
			out.push_str("Ctrl-");
		}
		if self.alt {
			out.push_str("Alt-");
		}
		if self.shift {
			out.push_str("Shift-");
		}
		out
	}
}

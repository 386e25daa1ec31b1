//! Command batches.
//!
//! A batch is the unit of submission to the control loop: it is produced by
//! one source (a key resolution, a plugin call, the CLI) and executes as a
//! contiguous run. Items never interleave with another batch.

use serde::{Deserialize, Serialize};

/// One command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandItem {
	pub name: String,
	pub args: Vec<String>,
}

impl CommandItem {
	pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			name: name.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}

	/// Parses a command line typed by the user: whitespace separated, first
	/// word is the command name. Returns `None` for a blank line.
	pub fn parse_line(line: &str) -> Option<Self> {
		let mut words = line.split_whitespace();
		let name = words.next()?;
		Some(Self {
			name: name.to_string(),
			args: words.map(str::to_string).collect(),
		})
	}
}

/// Ordered group of command invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBatch {
	pub items: Vec<CommandItem>,
}

impl CommandBatch {
	pub fn new(items: Vec<CommandItem>) -> Self {
		Self { items }
	}

	pub fn single(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			items: vec![CommandItem::new(name, args)],
		}
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

impl FromIterator<CommandItem> for CommandBatch {
	fn from_iter<I: IntoIterator<Item = CommandItem>>(iter: I) -> Self {
		Self {
			items: iter.into_iter().collect(),
		}
	}
}

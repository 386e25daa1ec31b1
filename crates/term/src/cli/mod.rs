//! CLI schema for the kiln binary.

use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use kiln_primitives::CommandItem;

/// A file to open, with an optional 1-based `:line[:column]` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTarget {
	pub path: String,
	/// 0-based.
	pub line: Option<usize>,
	/// 0-based.
	pub column: Option<usize>,
}

impl FromStr for OpenTarget {
	type Err = Infallible;

	/// `a.txt`, `a.txt:3` or `a.txt:3:7`. A suffix that is not a positive
	/// number stays part of the path. A leading drive letter (`C:`) is not
	/// mistaken for a suffix.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let drive = if s.len() > 2 && s.as_bytes().get(1) == Some(&b':') { 2 } else { 0 };
		let (head, tail) = s.split_at(drive);

		let positive = |part: &str| part.parse::<usize>().ok().filter(|n| *n > 0);
		let mut parts = tail.rsplitn(3, ':').collect::<Vec<_>>();
		parts.reverse();

		let target = match parts.as_slice() {
			&[path, line, column] if !path.is_empty() => match (positive(line), positive(column)) {
				(Some(line), Some(column)) => Some((format!("{head}{path}"), line - 1, Some(column - 1))),
				(None, Some(last)) => Some((format!("{head}{path}:{line}"), last - 1, None)),
				_ => None,
			},
			&[path, line] if !path.is_empty() => positive(line).map(|line| (format!("{head}{path}"), line - 1, None)),
			_ => None,
		};

		Ok(match target {
			Some((path, line, column)) => Self {
				path,
				line: Some(line),
				column,
			},
			None => Self {
				path: s.to_string(),
				line: None,
				column: None,
			},
		})
	}
}

impl OpenTarget {
	/// Commands that open this target in a fresh editor.
	pub fn commands(&self) -> Vec<CommandItem> {
		let mut items = vec![CommandItem::new("document_open", [self.path.clone()])];
		if let Some(line) = self.line {
			let column = self.column.unwrap_or(0);
			items.push(CommandItem::new("document_cursor_move", [line.to_string(), column.to_string()]));
		}
		items
	}
}

#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(about = "A terminal editor driven by out-of-process plugins")]
#[command(version)]
pub struct Cli {
	/// File to open. Supports path:line and path:line:col.
	pub file: Option<OpenTarget>,

	/// Configuration file (defaults to <config dir>/kiln/config.toml).
	#[arg(long, value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Start without loading any plugin.
	#[arg(long)]
	pub no_plugins: bool,

	/// Verbose logging.
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Inspect plugins without starting the editor
	Plugins {
		#[command(subcommand)]
		action: PluginsAction,
	},
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginsAction {
	/// Print the command line of every discovered plugin
	List,
	/// Load every discovered plugin, report the outcome, then unload
	Check,
}

impl Cli {
	/// Startup batch: the status bar, then either the named file or an
	/// empty document.
	pub fn startup_commands(&self) -> Vec<CommandItem> {
		let mut items = vec![CommandItem::new("bootstrap_ui", Vec::<String>::new())];
		match &self.file {
			Some(target) => items.extend(target.commands()),
			None => items.push(CommandItem::new("document_new", Vec::<String>::new())),
		}
		items
	}
}

#[cfg(test)]
mod tests;

//! Command router.
//!
//! Commands live in per-view scopes. A name resolves by walking from the
//! target window up to the root; the first scope that has it wins, so a view
//! can shadow a root command. Failures of any kind surface as an `alert`
//! rather than escaping the control loop.

mod builtins;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use kiln_primitives::WindowId;
use thiserror::Error;

pub use self::builtins::{ALIASES, BUILTINS, install_builtins};
use crate::Editor;
use crate::window::{TreeError, WindowTree};

/// Dispatch nesting bound. Aliases that point at each other stop here.
pub const MAX_DISPATCH_DEPTH: usize = 16;

/// Errors returned by command handlers. The router turns them into alerts.
#[derive(Debug, Error)]
pub enum CommandError {
	/// Shown to the user verbatim.
	#[error("{0}")]
	Usage(String),
	#[error("\"{0}\" is not a window id")]
	BadWindowId(String),
	#[error(transparent)]
	Tree(#[from] TreeError),
	#[error("cannot activate window {0}: its view is disabled")]
	Disabled(WindowId),
	#[error("unknown view factory \"{0}\"")]
	UnknownFactory(String),
	#[error("view dirty: {0}")]
	Dirty(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
	Editor,
	Window,
	Document,
	Alias,
	Plugin,
}

impl fmt::Display for CommandCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Editor => "editor",
			Self::Window => "window",
			Self::Document => "document",
			Self::Alias => "alias",
			Self::Plugin => "plugin",
		})
	}
}

/// A named operation executable from a window.
pub trait Command: Send + Sync {
	fn name(&self) -> &str;

	/// Exact argument count, or `None` for any.
	fn expected_args(&self) -> Option<usize>;

	fn category(&self) -> CommandCategory;

	fn short_desc(&self) -> &str;

	/// Usage text, shown when the argument count does not match.
	fn long_desc(&self) -> &str;

	fn handle(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError>;
}

/// Handler signature for statically defined commands.
pub type CommandHandler = fn(&mut CommandContext<'_>, &[String]) -> Result<(), CommandError>;

/// A statically defined command.
#[derive(Clone, Copy)]
pub struct CommandDef {
	pub name: &'static str,
	pub expected_args: Option<usize>,
	pub category: CommandCategory,
	pub short_desc: &'static str,
	pub long_desc: &'static str,
	pub handler: CommandHandler,
}

impl Command for CommandDef {
	fn name(&self) -> &str {
		self.name
	}

	fn expected_args(&self) -> Option<usize> {
		self.expected_args
	}

	fn category(&self) -> CommandCategory {
		self.category
	}

	fn short_desc(&self) -> &str {
		self.short_desc
	}

	fn long_desc(&self) -> &str {
		self.long_desc
	}

	fn handle(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
		(self.handler)(ctx, args)
	}
}

/// Re-dispatches to `target` with the same arguments, resolved from the
/// window the alias was invoked on.
pub struct CommandAlias {
	name: String,
	target: String,
	desc: String,
}

impl CommandAlias {
	pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
		let name = name.into();
		let target = target.into();
		let desc = format!("alias for \"{target}\"");
		Self { name, target, desc }
	}

	pub fn target(&self) -> &str {
		&self.target
	}
}

impl Command for CommandAlias {
	fn name(&self) -> &str {
		&self.name
	}

	fn expected_args(&self) -> Option<usize> {
		None
	}

	fn category(&self) -> CommandCategory {
		CommandCategory::Alias
	}

	fn short_desc(&self) -> &str {
		&self.desc
	}

	fn long_desc(&self) -> &str {
		&self.desc
	}

	fn handle(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
		ctx.execute(&self.target, args);
		Ok(())
	}
}

/// Command table of one scope.
#[derive(Clone, Default)]
pub struct Commands {
	commands: HashMap<String, Arc<dyn Command>>,
}

impl Commands {
	/// Adds `command`, replacing a same-named one. Returns true if the name
	/// was not taken.
	pub fn register(&mut self, command: Arc<dyn Command>) -> bool {
		self.commands.insert(command.name().to_string(), command).is_none()
	}

	pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn Command>> {
		self.commands.remove(name)
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
		self.commands.get(name)
	}

	/// Sorted command names.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<_> = self.commands.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}
}

/// Finds `name` starting at `target` and walking up to the root.
pub fn lookup(tree: &WindowTree, target: WindowId, name: &str) -> Option<Arc<dyn Command>> {
	tree.ancestors(target)
		.find_map(|window| window.view.commands.get(name))
		.cloned()
}

/// Resolves and runs one command synchronously.
///
/// Unknown names, argument count mismatches and handler errors all end in
/// an `alert` on the same target.
pub fn dispatch(editor: &mut Editor, target: WindowId, name: &str, args: &[String]) {
	if editor.dispatch_depth >= MAX_DISPATCH_DEPTH {
		tracing::warn!(command = name, depth = editor.dispatch_depth, "command nesting too deep, dropping");
		return;
	}

	let Some(command) = lookup(editor.tree(), target, name) else {
		if name == "alert" {
			tracing::error!(window = %target, "alert is not reachable from window");
			return;
		}
		editor.alert(target, format!("command \"{name}\" not found"));
		return;
	};

	if let Some(expected) = command.expected_args()
		&& expected != args.len()
	{
		tracing::debug!(command = name, expected, got = args.len(), "argument count mismatch");
		editor.alert(target, command.long_desc().to_string());
		return;
	}

	tracing::trace!(command = name, window = %target, ?args, "dispatch");
	editor.dispatch_depth += 1;
	let result = command.handle(
		&mut CommandContext {
			editor: &mut *editor,
			window: target,
		},
		args,
	);
	editor.dispatch_depth -= 1;

	if let Err(error) = result {
		if name == "alert" {
			tracing::warn!(%error, "alert handler failed");
		} else {
			tracing::debug!(command = name, %error, "command failed");
			editor.alert(target, error.to_string());
		}
	}
	editor.request_redraw();
}

/// What a handler sees: the editor and the window it was invoked on.
pub struct CommandContext<'a> {
	pub editor: &'a mut Editor,
	pub window: WindowId,
}

impl CommandContext<'_> {
	/// Queues a follow-up command as its own batch.
	pub fn post(&self, name: &str, args: &[String]) {
		self.editor.sender().post(name, args.iter().cloned());
	}

	/// Runs another command now, on the same window.
	pub fn execute(&mut self, name: &str, args: &[String]) {
		dispatch(self.editor, self.window, name, args);
	}

	pub fn alert(&mut self, message: impl Into<String>) {
		self.editor.alert(self.window, message);
	}

	/// Resolves a `window|global` scope argument.
	pub fn scope(&self, which: &str, usage: &str) -> Result<WindowId, CommandError> {
		match which {
			"window" => Ok(self.window),
			"global" => Ok(WindowId::ROOT),
			_ => Err(CommandError::Usage(usage.to_string())),
		}
	}

	/// Parses a window id argument that must name an existing window.
	pub fn window_arg(&self, arg: &str) -> Result<WindowId, CommandError> {
		let id = arg
			.parse::<u32>()
			.map(WindowId)
			.map_err(|_| CommandError::BadWindowId(arg.to_string()))?;
		if self.editor.tree().contains(id) {
			Ok(id)
		} else {
			Err(TreeError::NoSuchWindow(id).into())
		}
	}
}

#[cfg(test)]
mod tests;

//! Commands installed on the root view at startup.

use std::sync::Arc;

use kiln_primitives::KeyboardMode;

use super::{CommandAlias, CommandCategory, CommandContext, CommandDef, CommandError, Commands};
use crate::keymap::KeyBindings;
use crate::window::Docking;

macro_rules! builtin {
	($ident:ident, $name:literal, args: $args:expr, $category:ident, $short:literal, $long:literal, $handler:path) => {
		pub static $ident: CommandDef = CommandDef {
			name: $name,
			expected_args: $args,
			category: CommandCategory::$category,
			short_desc: $short,
			long_desc: $long,
			handler: $handler,
		};
	};
}

builtin!(ALERT, "alert", args: Some(1), Editor,
	"show a message",
	"usage: alert <message>",
	alert);
builtin!(BOOTSTRAP_UI, "bootstrap_ui", args: Some(0), Window,
	"create the status bar",
	"usage: bootstrap_ui",
	bootstrap_ui);
builtin!(COMMAND_ALIAS, "command_alias", args: Some(3), Editor,
	"define a command alias",
	"usage: command_alias <window|global> <alias> <command>",
	command_alias);
builtin!(DOCUMENT_CURSOR_MOVE, "document_cursor_move", args: Some(2), Document,
	"move the cursor of the current document",
	"usage: document_cursor_move <line> <column>",
	document_cursor_move);
builtin!(DOCUMENT_NEW, "document_new", args: Some(0), Document,
	"open an empty document",
	"usage: document_new",
	document_new);
builtin!(DOCUMENT_OPEN, "document_open", args: Some(1), Document,
	"open a document by path",
	"usage: document_open <path>",
	document_open);
builtin!(EDITOR_REDRAW, "editor_redraw", args: Some(0), Editor,
	"redraw the screen",
	"usage: editor_redraw",
	editor_redraw);
builtin!(KEYBIND, "keybind", args: Some(4), Editor,
	"bind a key to a command",
	"usage: keybind <window|global> <command|edit|all> <key> <command>",
	keybind);
builtin!(QUIT, "quit", args: Some(0), Editor,
	"exit the editor",
	"usage: quit",
	quit);
builtin!(SHOW_COMMAND_WINDOW, "show_command_window", args: Some(0), Window,
	"open the command line",
	"usage: show_command_window",
	show_command_window);
builtin!(WINDOW_ACTIVATE, "window_activate", args: Some(1), Window,
	"focus a window",
	"usage: window_activate <window>",
	window_activate);
builtin!(WINDOW_CLOSE, "window_close", args: Some(1), Window,
	"close a window and its children",
	"usage: window_close <window>",
	window_close);
builtin!(WINDOW_LOG, "window_log", args: Some(0), Window,
	"log the window tree",
	"usage: window_log",
	window_log);
builtin!(WINDOW_NEW, "window_new", args: Some(3), Window,
	"create a child window",
	"usage: window_new <parent> <fill|floating|left|right|top|bottom> <view factory>",
	window_new);

pub static BUILTINS: &[&CommandDef] = &[
	&ALERT,
	&BOOTSTRAP_UI,
	&COMMAND_ALIAS,
	&DOCUMENT_CURSOR_MOVE,
	&DOCUMENT_NEW,
	&DOCUMENT_OPEN,
	&EDITOR_REDRAW,
	&KEYBIND,
	&QUIT,
	&SHOW_COMMAND_WINDOW,
	&WINDOW_ACTIVATE,
	&WINDOW_CLOSE,
	&WINDOW_LOG,
	&WINDOW_NEW,
];

/// `(alias, target)` pairs installed next to the builtins.
pub static ALIASES: &[(&str, &str)] = &[
	("alias", "command_alias"),
	("new", "document_new"),
	("open", "document_open"),
	("q", "quit"),
];

const DEFAULT_KEYS: &[(KeyboardMode, &str, &str)] = &[
	(KeyboardMode::Edit, ":", "show_command_window"),
	(KeyboardMode::Edit, "Ctrl-N", "document_new"),
	(KeyboardMode::All, "Ctrl-Q", "quit"),
	(KeyboardMode::All, "Ctrl-L", "editor_redraw"),
];

/// Installs builtins, their aliases and the default key bindings.
pub fn install_builtins(commands: &mut Commands, keys: &mut KeyBindings) {
	for def in BUILTINS {
		commands.register(Arc::new(**def));
	}
	for (alias, target) in ALIASES {
		commands.register(Arc::new(CommandAlias::new(*alias, *target)));
	}
	for (mode, key, command) in DEFAULT_KEYS {
		keys.bind(*mode, *key, *command);
	}
}

fn alert(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	ctx.editor.show_alert(&args[0]);
	Ok(())
}

fn bootstrap_ui(ctx: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	let status = ctx.editor.open_window(ctx.window, Docking::Bottom, true, "status_root")?;
	ctx.editor.open_window(status, Docking::Left, true, "status_name")?;
	ctx.editor.open_window(status, Docking::Right, true, "status_position")?;
	Ok(())
}

fn command_alias(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	let scope = ctx.scope(&args[0], COMMAND_ALIAS.long_desc)?;
	let alias = CommandAlias::new(&args[1], &args[2]);
	ctx.editor.register_command(scope, Arc::new(alias))?;
	Ok(())
}

fn document_cursor_move(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	let (Ok(line), Ok(column)) = (args[0].parse::<usize>(), args[1].parse::<usize>()) else {
		return Err(CommandError::Usage(DOCUMENT_CURSOR_MOVE.long_desc.to_string()));
	};
	let Some(document) = ctx.editor.document_at(ctx.window) else {
		return Err(CommandError::Usage("no document in this window".to_string()));
	};
	ctx.editor.move_cursor(document, line, column);
	Ok(())
}

fn document_new(ctx: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	ctx.editor.new_document(ctx.window, None)?;
	Ok(())
}

fn document_open(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	ctx.editor.new_document(ctx.window, Some(args[0].clone()))?;
	Ok(())
}

fn editor_redraw(ctx: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	ctx.editor.request_redraw();
	Ok(())
}

fn keybind(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	let scope = ctx.scope(&args[0], KEYBIND.long_desc)?;
	let mode = args[1]
		.parse::<KeyboardMode>()
		.map_err(|_| CommandError::Usage(KEYBIND.long_desc.to_string()))?;
	ctx.editor.bind_key(scope, mode, &args[2], &args[3])?;
	Ok(())
}

fn quit(ctx: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	if let Some(title) = ctx.editor.first_dirty_view() {
		return Err(CommandError::Dirty(title));
	}
	ctx.editor.request_quit();
	Ok(())
}

fn show_command_window(ctx: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	ctx.editor.open_command_window()?;
	Ok(())
}

fn window_activate(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	let window = ctx.window_arg(&args[0])?;
	ctx.editor.activate(window)
}

fn window_close(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	let window = ctx.window_arg(&args[0])?;
	ctx.editor.close_window(window)?;
	Ok(())
}

fn window_log(ctx: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	tracing::info!(active = %ctx.editor.active_window(), "window tree:\n{}", ctx.editor.tree().describe());
	Ok(())
}

fn window_new(ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), CommandError> {
	let parent = ctx.window_arg(&args[0])?;
	let docking = args[1].parse::<Docking>().map_err(CommandError::Usage)?;
	ctx.editor.open_window(parent, docking, true, &args[2])?;
	Ok(())
}

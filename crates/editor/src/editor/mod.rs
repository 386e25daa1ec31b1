//! Editor state.
//!
//! Everything here is owned and mutated by the control loop. Other tasks
//! reach the editor only through the [`CommandSender`], the [`EventBus`]
//! and the [`RedrawHandle`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use kiln_events::{
	DeferredQueue, DocumentCreated, DocumentCursorMoved, EditorKeyboardModeChanged, EventBus, TerminalResized, ViewActivated,
	ViewCreated, WindowCreated, WindowResized,
};
use kiln_plugin::EditorSnapshot;
use kiln_primitives::{CommandItem, DocumentId, KeyCode, KeyPress, KeyboardMode, Size, ViewId, WindowId};
use tokio::sync::mpsc;

use crate::command_queue::{self, CommandReceiver, CommandSender};
use crate::commands::{self, Command, CommandError, install_builtins};
use crate::window::{Docking, TreeError, View, ViewFactories, Window, WindowTree};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wakes the control loop's redraw debounce. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RedrawHandle {
	tx: mpsc::UnboundedSender<()>,
}

impl RedrawHandle {
	pub fn request(&self) {
		let _ = self.tx.send(());
	}
}

/// Receiving ends the control loop selects over.
pub struct EditorChannels {
	pub commands: CommandReceiver,
	pub deferred: DeferredQueue,
	pub redraw: mpsc::UnboundedReceiver<()>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	pub id: DocumentId,
	pub title: String,
	pub path: Option<PathBuf>,
	/// Unsaved modifications. `quit` refuses while any document has them.
	pub modified: bool,
	pub line: usize,
	pub column: usize,
}

pub struct Editor {
	id: String,
	tree: WindowTree,
	factories: ViewFactories,
	documents: BTreeMap<DocumentId, Document>,
	next_document: u32,
	/// Most recently activated first. Never empty; the root is the fallback.
	history: Vec<WindowId>,
	mode: KeyboardMode,
	command_line: String,
	command_window: Option<WindowId>,
	alerts: Vec<String>,
	bus: EventBus,
	sender: CommandSender,
	redraw: RedrawHandle,
	quit: bool,
	pub(crate) dispatch_depth: usize,
}

impl Editor {
	/// A fresh editor with builtins on the root view, plus the channel ends
	/// for the loop that will drive it.
	pub fn new(size: Size, deferred_high_water: usize) -> (Self, EditorChannels) {
		let (bus, deferred) = EventBus::new(deferred_high_water);
		let (sender, commands) = command_queue::channel();
		let (redraw_tx, redraw) = mpsc::unbounded_channel();

		let tree = WindowTree::new(size, |id| {
			let mut view = View::new(id, "root", "kiln");
			install_builtins(&mut view.commands, &mut view.keybindings);
			view
		});

		let editor = Self {
			id: uuid::Uuid::new_v4().to_string(),
			tree,
			factories: ViewFactories::default(),
			documents: BTreeMap::new(),
			next_document: 1,
			history: vec![WindowId::ROOT],
			mode: KeyboardMode::default(),
			command_line: String::new(),
			command_window: None,
			alerts: Vec::new(),
			bus,
			sender,
			redraw: RedrawHandle { tx: redraw_tx },
			quit: false,
			dispatch_depth: 0,
		};
		(
			editor,
			EditorChannels {
				commands,
				deferred,
				redraw,
			},
		)
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn tree(&self) -> &WindowTree {
		&self.tree
	}

	pub fn bus(&self) -> &EventBus {
		&self.bus
	}

	pub fn sender(&self) -> &CommandSender {
		&self.sender
	}

	pub fn redraw_handle(&self) -> RedrawHandle {
		self.redraw.clone()
	}

	pub fn request_redraw(&self) {
		self.redraw.request();
	}

	pub fn view_factories(&self) -> &ViewFactories {
		&self.factories
	}

	pub fn view_factories_mut(&mut self) -> &mut ViewFactories {
		&mut self.factories
	}

	/// Runs `name` on `window` now. See [`commands::dispatch`].
	pub fn execute(&mut self, window: WindowId, name: &str, args: &[String]) {
		commands::dispatch(self, window, name, args);
	}

	/// Dispatches the `alert` command. Falls back to the root when `window`
	/// no longer exists.
	pub fn alert(&mut self, window: WindowId, message: impl Into<String>) {
		let window = if self.tree.contains(window) { window } else { WindowId::ROOT };
		commands::dispatch(self, window, "alert", &[message.into()]);
	}

	/// Records an alert. Called by the `alert` builtin.
	pub fn show_alert(&mut self, message: &str) {
		tracing::info!(alert = message);
		self.alerts.push(message.to_string());
		self.request_redraw();
	}

	pub fn alerts(&self) -> &[String] {
		&self.alerts
	}

	/// Adds `command` to the view of `scope`. Returns true if the name was new
	/// in that scope.
	pub fn register_command(&mut self, scope: WindowId, command: Arc<dyn Command>) -> Result<bool, CommandError> {
		let window = self.window_mut(scope)?;
		Ok(window.view.commands.register(command))
	}

	pub fn unregister_command(&mut self, scope: WindowId, name: &str) -> Result<Option<Arc<dyn Command>>, CommandError> {
		let window = self.window_mut(scope)?;
		Ok(window.view.commands.unregister(name))
	}

	pub fn bind_key(&mut self, scope: WindowId, mode: KeyboardMode, key: &str, command: &str) -> Result<bool, CommandError> {
		let window = self.window_mut(scope)?;
		Ok(window.view.keybindings.bind(mode, key, command))
	}

	/// The binding for `key` seen from the active window: each scope up to
	/// the root is checked for the current mode, then for `All`.
	pub fn lookup_key(&self, key: &str) -> Option<&str> {
		self.tree
			.ancestors(self.active_window())
			.find_map(|window| window.view.keybindings.resolve(self.mode, key))
	}

	pub fn active_window(&self) -> WindowId {
		self.history.first().copied().unwrap_or(WindowId::ROOT)
	}

	/// Windows by recency of activation, most recent first.
	pub fn activation_history(&self) -> &[WindowId] {
		&self.history
	}

	/// Makes `window` the active one. Disabled views refuse.
	pub fn activate(&mut self, window: WindowId) -> Result<(), CommandError> {
		let target = self.tree.get(window).ok_or(TreeError::NoSuchWindow(window))?;
		if target.view.disabled {
			return Err(CommandError::Disabled(window));
		}
		let view = target.view.id;

		self.history.retain(|id| *id != window);
		self.history.insert(0, window);
		self.bus.publish(ViewActivated { view });
		self.request_redraw();
		Ok(())
	}

	/// Creates a window under `parent` with a view from the named factory.
	pub fn open_window(
		&mut self,
		parent: WindowId,
		docking: Docking,
		exclusive: bool,
		factory: &str,
	) -> Result<WindowId, CommandError> {
		let build = self
			.factories
			.get(factory)
			.ok_or_else(|| CommandError::UnknownFactory(factory.to_string()))?;
		self.attach(parent, docking, exclusive, build)
	}

	fn attach(
		&mut self,
		parent: WindowId,
		docking: Docking,
		exclusive: bool,
		view: impl FnOnce(ViewId) -> View,
	) -> Result<WindowId, CommandError> {
		let window = self.tree.attach(parent, docking, exclusive, view)?;
		let view = self.tree.get(window).map(|w| w.view.id);
		tracing::debug!(%window, %parent, %docking, "window created");

		self.bus.publish(WindowCreated { window });
		if let Some(view) = view {
			self.bus.publish(ViewCreated { view });
		}
		self.request_redraw();
		Ok(window)
	}

	/// Closes `window` and its subtree, dropping them from the activation
	/// history.
	pub fn close_window(&mut self, window: WindowId) -> Result<Vec<WindowId>, CommandError> {
		let before = self.active_window();
		let removed = self.tree.close(window)?;

		self.history.retain(|id| !removed.contains(id));
		if self.history.is_empty() {
			self.history.push(WindowId::ROOT);
		}
		if let Some(command_window) = self.command_window
			&& removed.contains(&command_window)
		{
			self.command_window = None;
			self.command_line.clear();
			self.set_keyboard_mode(KeyboardMode::Edit);
		}

		let after = self.active_window();
		if after != before
			&& let Some(view) = self.tree.get(after).map(|w| w.view.id)
		{
			self.bus.publish(ViewActivated { view });
		}
		tracing::debug!(%window, removed = removed.len(), "window closed");
		self.request_redraw();
		Ok(removed)
	}

	fn window_mut(&mut self, id: WindowId) -> Result<&mut Window, CommandError> {
		self.tree
			.get_mut(id)
			.ok_or_else(|| TreeError::NoSuchWindow(id).into())
	}

	/// Opens a document in a new fill window under `parent` and activates it.
	/// Without a path the document is untitled.
	pub fn new_document(&mut self, parent: WindowId, path: Option<String>) -> Result<DocumentId, CommandError> {
		let id = DocumentId(self.next_document);
		let title = match &path {
			Some(path) => path.clone(),
			None => format!("New document {}", self.next_document),
		};

		let window = self.attach(parent, Docking::Fill, false, |view| {
			let mut view = View::new(view, "document", title.clone());
			view.document = Some(id);
			view
		})?;
		self.next_document += 1;

		self.documents.insert(
			id,
			Document {
				id,
				title: title.clone(),
				path: path.map(PathBuf::from),
				modified: false,
				line: 0,
				column: 0,
			},
		);
		self.bus.publish(DocumentCreated { document: id, title });
		self.activate(window)?;
		Ok(id)
	}

	pub fn document(&self, id: DocumentId) -> Option<&Document> {
		self.documents.get(&id)
	}

	pub fn documents(&self) -> impl Iterator<Item = &Document> {
		self.documents.values()
	}

	/// Flags or clears unsaved modifications. Returns false for an unknown id.
	pub fn mark_modified(&mut self, id: DocumentId, modified: bool) -> bool {
		let Some(document) = self.documents.get_mut(&id) else {
			return false;
		};
		document.modified = modified;
		true
	}

	/// The document shown by `window` or its nearest ancestor.
	pub fn document_at(&self, window: WindowId) -> Option<DocumentId> {
		self.tree.ancestors(window).find_map(|w| w.view.document)
	}

	pub fn move_cursor(&mut self, id: DocumentId, line: usize, column: usize) {
		let Some(document) = self.documents.get_mut(&id) else {
			return;
		};
		document.line = line;
		document.column = column;
		self.bus.publish(DocumentCursorMoved {
			document: id,
			line,
			column,
		});
		self.request_redraw();
	}

	/// Title of the first view, depth first from the root, whose document
	/// has unsaved modifications.
	pub fn first_dirty_view(&self) -> Option<String> {
		self.tree.depth_first(WindowId::ROOT).into_iter().find_map(|id| {
			let view = &self.tree.get(id)?.view;
			let document = self.documents.get(&view.document?)?;
			document.modified.then(|| view.title.clone())
		})
	}

	pub fn request_quit(&mut self) {
		tracing::debug!("quit requested");
		self.quit = true;
		self.request_redraw();
	}

	pub fn quit_requested(&self) -> bool {
		self.quit
	}

	pub fn keyboard_mode(&self) -> KeyboardMode {
		self.mode
	}

	pub fn set_keyboard_mode(&mut self, mode: KeyboardMode) {
		if self.mode == mode {
			return;
		}
		self.mode = mode;
		self.bus.publish(EditorKeyboardModeChanged { mode });
		self.request_redraw();
	}

	pub fn command_line(&self) -> &str {
		&self.command_line
	}

	/// Shows the floating command window, switching to command mode.
	pub fn open_command_window(&mut self) -> Result<WindowId, CommandError> {
		let window = match self.command_window {
			Some(window) if self.tree.contains(window) => window,
			_ => {
				let window = self.open_window(WindowId::ROOT, Docking::Floating, true, "command")?;
				self.command_window = Some(window);
				window
			}
		};
		self.command_line.clear();
		self.activate(window)?;
		self.set_keyboard_mode(KeyboardMode::Command);
		Ok(window)
	}

	pub fn close_command_window(&mut self) {
		if let Some(window) = self.command_window
			&& let Err(error) = self.close_window(window)
		{
			tracing::debug!(%error, "command window already gone");
		}
		self.command_window = None;
		self.command_line.clear();
		self.set_keyboard_mode(KeyboardMode::Edit);
	}

	/// Closes the command window and runs what was typed on the window
	/// that becomes active.
	fn submit_command_line(&mut self) {
		let line = std::mem::take(&mut self.command_line);
		self.close_command_window();
		if let Some(item) = CommandItem::parse_line(&line) {
			self.execute(self.active_window(), &item.name, &item.args);
		}
	}

	/// Handles one key press: bindings first, then command line editing.
	pub fn handle_key(&mut self, key: KeyPress) {
		let name = key.name();
		if let Some(binding) = self.lookup_key(&name).map(str::to_string) {
			if let Some(item) = CommandItem::parse_line(&binding) {
				tracing::trace!(key = %name, command = %item.name, "key binding");
				self.execute(self.active_window(), &item.name, &item.args);
			}
			return;
		}

		if self.mode != KeyboardMode::Command {
			tracing::trace!(key = %name, "unbound key");
			return;
		}
		match key.code {
			KeyCode::Enter => self.submit_command_line(),
			KeyCode::Esc => self.close_command_window(),
			KeyCode::Backspace => {
				self.command_line.pop();
				self.request_redraw();
			}
			_ => {
				if let Some(c) = key.printable() {
					self.command_line.push(c);
					self.request_redraw();
				}
			}
		}
	}

	/// Applies a terminal resize to the root window.
	pub fn resize(&mut self, size: Size) {
		self.tree.resize(size);
		self.bus.publish(TerminalResized { size });
		self.bus.publish(WindowResized {
			window: WindowId::ROOT,
			size,
		});
		self.request_redraw();
	}

	/// Read-only state answered to plugins.
	pub fn snapshot(&self) -> EditorSnapshot {
		EditorSnapshot {
			editor_id: self.id.clone(),
			editor_version: VERSION.to_string(),
			active_window: self.active_window(),
			view_factory_names: self.factories.names(),
			keyboard_mode: self.mode,
		}
	}
}

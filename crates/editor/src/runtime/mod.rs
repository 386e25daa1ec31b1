//! The control loop.
//!
//! One task owns the [`Editor`] and is the only consumer of its input
//! sources. Each [`step`](ControlLoop::step) waits for whichever source is
//! ready first; there is no fixed priority between them.
//!
//! Redraws are debounced: the first redraw signal arms a short timer,
//! signals arriving while it is armed are absorbed, and the timer firing
//! drains whatever is left and draws once. The quit flag is checked on the
//! same timer, so a quit always takes effect after the last frame of work
//! has been flushed through the queue.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use kiln_events::{CommandsPosted, DeferredQueue, TerminalKeyPressed};
use kiln_plugin::{ChannelOptions, HostBridge, PluginLoadError, PluginManager};
use kiln_primitives::{CommandBatch, WindowId};
use tokio::sync::mpsc;
use tokio::time::Sleep;

use crate::command_queue::{CommandReceiver, CommandSender};
use crate::commands;
use crate::config::Config;
use crate::editor::{Editor, EditorChannels};
use crate::error::{EditorError, Result};
use crate::render;
use crate::terminal::{Terminal, TerminalEvent};

/// Outcome of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	Continue,
	Quit,
}

pub struct ControlLoop<T> {
	editor: Editor,
	terminal: T,
	commands: CommandReceiver,
	input: mpsc::UnboundedReceiver<TerminalEvent>,
	deferred: DeferredQueue,
	redraw: mpsc::UnboundedReceiver<()>,
	draw_timer: Option<Pin<Box<Sleep>>>,
	debounce: Duration,
	host: HostBridge,
	plugins: Option<PluginManager>,
}

impl<T: Terminal> ControlLoop<T> {
	/// A fresh editor sized to `terminal`, configured from `config`.
	pub fn new(terminal: T, config: &Config) -> Result<Self> {
		let (editor, channels) = Editor::new(terminal.size(), config.events.deferred_high_water);
		Self::with_editor(editor, channels, terminal, config.redraw_debounce())
	}

	/// Drives an existing editor.
	///
	/// Fails if `alert` does not resolve from the root, or if the terminal
	/// input stream was already taken.
	pub fn with_editor(editor: Editor, channels: EditorChannels, mut terminal: T, debounce: Duration) -> Result<Self> {
		if commands::lookup(editor.tree(), WindowId::ROOT, "alert").is_none() {
			return Err(EditorError::MissingAlert);
		}
		let input = terminal.take_events().ok_or(EditorError::InputTaken)?;
		let host = HostBridge::new(editor.bus().clone(), editor.snapshot());

		Ok(Self {
			editor,
			terminal,
			commands: channels.commands,
			input,
			deferred: channels.deferred,
			redraw: channels.redraw,
			draw_timer: None,
			debounce,
			host,
			plugins: None,
		})
	}

	pub fn editor(&self) -> &Editor {
		&self.editor
	}

	pub fn editor_mut(&mut self) -> &mut Editor {
		&mut self.editor
	}

	pub fn terminal(&self) -> &T {
		&self.terminal
	}

	pub fn sender(&self) -> CommandSender {
		self.editor.sender().clone()
	}

	/// The bridge plugin connections answer from.
	pub fn host(&self) -> &HostBridge {
		&self.host
	}

	pub fn plugins(&self) -> Option<&PluginManager> {
		self.plugins.as_ref()
	}

	/// Spawns and handshakes every candidate. Failures are returned, never
	/// fatal; the plugins that did load stay loaded.
	pub async fn load_plugins(&mut self, candidates: Vec<Vec<String>>, options: ChannelOptions) -> Option<PluginLoadError> {
		let host = self.host.clone();
		let manager = self.plugins.get_or_insert_with(|| PluginManager::new(host, options));
		let error = manager.load(candidates).await;
		tracing::info!(loaded = manager.len(), failed = error.as_ref().map_or(0, |e| e.failures.len()), "plugins loaded");
		error
	}

	/// Runs until `quit`, then unloads plugins.
	pub async fn run(&mut self) -> Result<()> {
		self.editor.request_redraw();
		let outcome = loop {
			match self.step().await {
				Ok(Step::Continue) => {}
				Ok(Step::Quit) => break Ok(()),
				Err(error) => break Err(error),
			}
		};
		self.shutdown().await;
		outcome
	}

	/// Waits for one input source and handles it.
	pub async fn step(&mut self) -> Result<Step> {
		tokio::select! {
			Some(batch) = self.commands.recv() => self.run_batch(batch),
			Some(event) = self.input.recv() => self.on_terminal(event),
			Some(action) = self.deferred.recv() => action.run(),
			Some(()) = self.redraw.recv() => self.arm_draw_timer(),
			() = fire(&mut self.draw_timer) => {
				self.draw_timer = None;
				if self.editor.quit_requested() {
					return Ok(Step::Quit);
				}
				while self.redraw.try_recv().is_ok() {}
				self.draw()?;
			}
		}
		self.sync_snapshot();
		Ok(Step::Continue)
	}

	/// Executes every item of `batch` back to back, each on whichever window
	/// is active when it starts.
	fn run_batch(&mut self, batch: CommandBatch) {
		tracing::trace!(items = batch.len(), "command batch");
		self.editor.bus().publish(CommandsPosted { batch: batch.clone() });
		for item in batch.items {
			self.editor.execute(self.editor.active_window(), &item.name, &item.args);
		}
	}

	fn on_terminal(&mut self, event: TerminalEvent) {
		match event {
			TerminalEvent::Key(key) => {
				self.editor.bus().publish(TerminalKeyPressed { key });
				self.editor.handle_key(key);
			}
			TerminalEvent::Resize(size) => self.editor.resize(size),
		}
	}

	fn arm_draw_timer(&mut self) {
		if self.draw_timer.is_none() {
			self.draw_timer = Some(Box::pin(tokio::time::sleep(self.debounce)));
		}
	}

	fn draw(&mut self) -> Result<()> {
		let frame = render::compose(&self.editor);
		self.terminal.draw(&frame)?;
		Ok(())
	}

	fn sync_snapshot(&self) {
		let snapshot = self.editor.snapshot();
		if *self.host.snapshot() != snapshot {
			self.host.publish_snapshot(snapshot);
		}
	}

	async fn shutdown(&mut self) {
		let Some(plugins) = self.plugins.as_mut() else { return };
		if let Err(error) = plugins.unload_all().await {
			tracing::warn!(%error, "plugin unload");
		}
	}
}

/// Completes when the armed timer elapses; never when disarmed.
async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
	match timer {
		Some(sleep) => sleep.as_mut().await,
		None => pending().await,
	}
}

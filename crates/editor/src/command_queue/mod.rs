//! Command submission channel.
//!
//! Any task may hold a [`CommandSender`]; only the control loop holds the
//! receiving end. A batch is one message, so its items can never interleave
//! with another batch.

use kiln_primitives::{CommandBatch, CommandItem};
use tokio::sync::mpsc;

/// Cloneable submission handle.
#[derive(Debug, Clone)]
pub struct CommandSender {
	tx: mpsc::UnboundedSender<CommandBatch>,
}

/// Receiving end, owned by the control loop.
#[derive(Debug)]
pub struct CommandReceiver {
	rx: mpsc::UnboundedReceiver<CommandBatch>,
}

pub fn channel() -> (CommandSender, CommandReceiver) {
	let (tx, rx) = mpsc::unbounded_channel();
	(CommandSender { tx }, CommandReceiver { rx })
}

impl CommandSender {
	/// Submits a single command as its own batch.
	pub fn post(&self, name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) {
		self.post_batch(CommandBatch::single(name, args));
	}

	/// Submits `batch`; its items run back to back. Empty batches are dropped.
	pub fn post_batch(&self, batch: CommandBatch) {
		if batch.is_empty() {
			return;
		}
		if self.tx.send(batch).is_err() {
			tracing::trace!("command queue closed, dropping batch");
		}
	}

	/// Submits a batch built from `items`.
	pub fn post_items(&self, items: impl IntoIterator<Item = CommandItem>) {
		self.post_batch(CommandBatch::new(items.into_iter().collect()));
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

impl CommandReceiver {
	/// Next batch in submission order. `None` once every sender is gone.
	pub async fn recv(&mut self) -> Option<CommandBatch> {
		self.rx.recv().await
	}

	pub fn try_recv(&mut self) -> Option<CommandBatch> {
		self.rx.try_recv().ok()
	}
}

#[cfg(test)]
mod tests;

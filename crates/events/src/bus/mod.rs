//! Shared event bus handle and its deferred delivery queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::id::SEQ_MASK;
use crate::{Event, EventError, EventId, EventKind, EventPayload, Result, SubscriberList};

/// Pending deferred actions above which publishing logs a warning.
pub const DEFAULT_HIGH_WATER: usize = 2048;

type Callback = dyn Fn(&EventPayload) -> bool + Send + Sync;

struct Registry {
	next_seq: Vec<u32>,
	lists: Vec<SubscriberList<Callback>>,
}

impl Registry {
	fn new() -> Self {
		Self {
			next_seq: vec![0; EventKind::ALL.len()],
			lists: EventKind::ALL.iter().map(|_| SubscriberList::new()).collect(),
		}
	}

	/// Allocates the next free sequence number for `kind`, skipping any still
	/// held by a live subscription after wraparound.
	fn allocate(&mut self, kind: EventKind) -> u32 {
		let idx = kind.index();
		loop {
			let seq = self.next_seq[idx];
			self.next_seq[idx] = seq.wrapping_add(1) & SEQ_MASK;
			if !self.lists[idx].contains(seq) {
				return seq;
			}
		}
	}
}

/// Boxed closure queued by a publish and run by the queue consumer.
pub struct DeferredAction(Box<dyn FnOnce() + Send>);

impl DeferredAction {
	pub fn run(self) {
		(self.0)()
	}
}

impl std::fmt::Debug for DeferredAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("DeferredAction")
	}
}

/// Consumer side of the deferred action queue. Exactly one exists per bus.
pub struct DeferredQueue {
	rx: mpsc::UnboundedReceiver<DeferredAction>,
	pending: Arc<AtomicUsize>,
}

impl DeferredQueue {
	/// Waits for the next action. Returns `None` once every bus handle is gone.
	pub async fn recv(&mut self) -> Option<DeferredAction> {
		let action = self.rx.recv().await?;
		self.pending.fetch_sub(1, Ordering::Relaxed);
		Some(action)
	}

	pub fn try_recv(&mut self) -> Option<DeferredAction> {
		let action = self.rx.try_recv().ok()?;
		self.pending.fetch_sub(1, Ordering::Relaxed);
		Some(action)
	}

	/// Runs every action queued right now, including ones enqueued by the
	/// actions themselves. Returns how many ran.
	pub fn drain(&mut self) -> usize {
		let mut ran = 0;
		while let Some(action) = self.try_recv() {
			action.run();
			ran += 1;
		}
		ran
	}

	pub fn len(&self) -> usize {
		self.pending.load(Ordering::Relaxed)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

struct Shared {
	registry: Arc<Mutex<Registry>>,
	deferred: mpsc::UnboundedSender<DeferredAction>,
	pending: Arc<AtomicUsize>,
	high_water: usize,
}

/// Cloneable handle to the event registry.
#[derive(Clone)]
pub struct EventBus {
	shared: Arc<Shared>,
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("pending", &self.shared.pending.load(Ordering::Relaxed))
			.field("high_water", &self.shared.high_water)
			.finish_non_exhaustive()
	}
}

impl EventBus {
	/// Creates a bus and the single consumer of its deferred queue.
	pub fn new(high_water: usize) -> (Self, DeferredQueue) {
		let (tx, rx) = mpsc::unbounded_channel();
		let pending = Arc::new(AtomicUsize::new(0));
		let bus = Self {
			shared: Arc::new(Shared {
				registry: Arc::new(Mutex::new(Registry::new())),
				deferred: tx,
				pending: Arc::clone(&pending),
				high_water,
			}),
		};
		(bus, DeferredQueue { rx, pending })
	}

	/// Subscribes a typed callback. Returning `false` stops delivery of the
	/// current event to later subscribers.
	pub fn register<E: Event>(&self, callback: impl Fn(&E) -> bool + Send + Sync + 'static) -> EventId {
		self.register_payload(E::KIND, move |payload| E::from_payload(payload).is_none_or(|event| callback(event)))
	}

	/// Subscribes a type-erased callback to `kind`.
	pub fn register_payload(&self, kind: EventKind, callback: impl Fn(&EventPayload) -> bool + Send + Sync + 'static) -> EventId {
		let mut registry = self.shared.registry.lock();
		let seq = registry.allocate(kind);
		registry.lists[kind.index()].push(seq, Arc::new(callback));
		let id = EventId::new(kind, seq);
		tracing::trace!(id = %id, "event listener registered");
		id
	}

	pub fn unregister(&self, id: EventId) -> Result<()> {
		let removed = self.shared.registry.lock().lists[id.kind().index()].remove(id.seq());
		if !removed {
			return Err(EventError::ListenerNotFound(id.to_raw()));
		}
		tracing::trace!(id = %id, "event listener unregistered");
		Ok(())
	}

	/// Unregisters by wire id. Unknown kind tags fail like unknown sequences.
	pub fn unregister_raw(&self, raw: u32) -> Result<()> {
		let id = EventId::from_raw(raw).ok_or(EventError::ListenerNotFound(raw))?;
		self.unregister(id)
	}

	pub fn subscriber_count(&self, kind: EventKind) -> usize {
		self.shared.registry.lock().lists[kind.index()].len()
	}

	pub fn publish<E: Event>(&self, event: E) {
		self.publish_payload(event.into_payload());
	}

	/// Enqueues delivery of `payload`. Never blocks and never runs callbacks.
	pub fn publish_payload(&self, payload: EventPayload) {
		let kind = payload.kind();
		let registry = Arc::clone(&self.shared.registry);
		let action = DeferredAction(Box::new(move || {
			let callbacks = registry.lock().lists[kind.index()].snapshot();
			for callback in callbacks {
				if !callback(&payload) {
					break;
				}
			}
		}));

		let before = self.shared.pending.fetch_add(1, Ordering::Relaxed);
		if self.shared.deferred.send(action).is_err() {
			self.shared.pending.fetch_sub(1, Ordering::Relaxed);
			tracing::trace!(kind = kind.as_str(), "deferred queue closed, event dropped");
			return;
		}
		if before == self.shared.high_water {
			tracing::warn!(
				pending = before + 1,
				high_water = self.shared.high_water,
				kind = kind.as_str(),
				"deferred event queue above high-water mark"
			);
		}
	}
}

#[cfg(test)]
mod tests;

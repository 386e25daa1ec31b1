//! Event registry for the kiln control plane.
//!
//! Producers anywhere in the process publish events; delivery never happens
//! on the publishing task. Each publish enqueues one deferred action on the
//! [`DeferredQueue`], and the single consumer (the control loop) runs those
//! actions in FIFO order. Running an action snapshots the subscriber list of
//! the event kind and calls every callback in registration order until one
//! returns `false`.
//!
//! # Invariants
//!
//! * Callbacks never run while the registry lock is held, so a callback may
//!   register or unregister listeners.
//! * Publishing never blocks. The deferred queue is unbounded; crossing the
//!   configured high-water mark only logs.
//! * Event ids are never reused while the subscription they name is live.

mod bus;
mod defs;
mod error;
mod id;
mod subscribers;

pub use bus::{DEFAULT_HIGH_WATER, DeferredAction, DeferredQueue, EventBus};
pub use defs::{
	CommandsPosted, DocumentCreated, DocumentCursorMoved, EditorKeyboardModeChanged, Event, EventKind, EventPayload,
	TerminalKeyPressed, TerminalResized, ViewActivated, ViewCreated, WindowCreated, WindowResized,
};
pub use error::{EventError, Result};
pub use id::EventId;
pub use subscribers::SubscriberList;

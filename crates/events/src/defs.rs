//! Event definitions.
//!
//! Every event kind is declared once in [`define_events!`]. The macro emits
//! the kind enum (with its wire tag), one payload struct per kind, the
//! serializable [`EventPayload`] sum type and the typed [`Event`] impls.

use kiln_primitives::{CommandBatch, DocumentId, KeyPress, KeyboardMode, Size, ViewId, WindowId};
use serde::{Deserialize, Serialize};

/// Typed event. Implemented for every payload struct by [`define_events!`].
pub trait Event: Sized + Send + Sync + 'static {
	const KIND: EventKind;

	fn into_payload(self) -> EventPayload;

	fn from_payload(payload: &EventPayload) -> Option<&Self>;
}

macro_rules! define_events {
	($(
		$(#[$meta:meta])*
		$name:ident = $tag:literal { $($field:ident : $ty:ty),* $(,)? }
	),* $(,)?) => {
		/// Event kind discriminant. The value is the wire tag used in [`EventId`](crate::EventId).
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[repr(u8)]
		pub enum EventKind {
			$($name = $tag,)*
		}

		impl EventKind {
			/// Every kind, in tag order.
			pub const ALL: &'static [EventKind] = &[$(EventKind::$name,)*];

			pub const fn tag(self) -> u8 {
				self as u8
			}

			pub fn from_tag(tag: u8) -> Option<Self> {
				match tag {
					$($tag => Some(Self::$name),)*
					_ => None,
				}
			}

			/// Dense index into per-kind tables.
			pub(crate) const fn index(self) -> usize {
				self as usize - 1
			}

			pub fn as_str(self) -> &'static str {
				match self {
					$(Self::$name => stringify!($name),)*
				}
			}

			pub fn from_name(name: &str) -> Option<Self> {
				Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
			}
		}

		$(
			$(#[$meta])*
			#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
			pub struct $name {
				$(pub $field: $ty,)*
			}

			impl Event for $name {
				const KIND: EventKind = EventKind::$name;

				fn into_payload(self) -> EventPayload {
					EventPayload::$name(self)
				}

				fn from_payload(payload: &EventPayload) -> Option<&Self> {
					match payload {
						EventPayload::$name(event) => Some(event),
						_ => None,
					}
				}
			}
		)*

		/// Type-erased event, as carried by the deferred queue and sent to plugins.
		#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
		#[serde(tag = "kind")]
		pub enum EventPayload {
			$($name($name),)*
		}

		impl EventPayload {
			pub fn kind(&self) -> EventKind {
				match self {
					$(Self::$name(_) => EventKind::$name,)*
				}
			}
		}
	};
}

define_events! {
	/// A batch of commands was submitted to the command queue.
	CommandsPosted = 1 { batch: CommandBatch },
	DocumentCreated = 2 { document: DocumentId, title: String },
	DocumentCursorMoved = 3 { document: DocumentId, line: usize, column: usize },
	EditorKeyboardModeChanged = 4 { mode: KeyboardMode },
	/// Raw key press, published before keybinding resolution.
	TerminalKeyPressed = 5 { key: KeyPress },
	TerminalResized = 6 { size: Size },
	ViewActivated = 7 { view: ViewId },
	ViewCreated = 8 { view: ViewId },
	WindowCreated = 9 { window: WindowId },
	WindowResized = 10 { window: WindowId, size: Size },
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EventKind;

const KIND_SHIFT: u32 = 24;
pub(crate) const SEQ_MASK: u32 = (1 << KIND_SHIFT) - 1;

/// Identifier of one live subscription.
///
/// The wire form is `(kind_tag << 24) | seq`, which is what plugins see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub struct EventId {
	kind: EventKind,
	seq: u32,
}

impl EventId {
	pub(crate) const fn new(kind: EventKind, seq: u32) -> Self {
		Self {
			kind,
			seq: seq & SEQ_MASK,
		}
	}

	pub const fn kind(self) -> EventKind {
		self.kind
	}

	pub const fn seq(self) -> u32 {
		self.seq
	}

	pub const fn to_raw(self) -> u32 {
		((self.kind.tag() as u32) << KIND_SHIFT) | self.seq
	}

	/// Decodes the wire form. Returns `None` when the tag names no kind.
	pub fn from_raw(raw: u32) -> Option<Self> {
		let tag = u8::try_from(raw >> KIND_SHIFT).ok()?;
		let kind = EventKind::from_tag(tag)?;
		Some(Self::new(kind, raw & SEQ_MASK))
	}
}

impl From<EventId> for u32 {
	fn from(id: EventId) -> Self {
		id.to_raw()
	}
}

impl TryFrom<u32> for EventId {
	type Error = String;

	fn try_from(raw: u32) -> Result<Self, Self::Error> {
		Self::from_raw(raw).ok_or_else(|| format!("unknown event kind tag in {raw:#010x}"))
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.kind.as_str(), self.seq)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn raw_form_packs_tag_above_sequence() {
		let id = EventId::new(EventKind::DocumentCreated, 7);
		assert_eq!(id.to_raw(), 0x0200_0007);
		assert_eq!(EventId::from_raw(0x0200_0007), Some(id));
	}

	#[test]
	fn unknown_tag_does_not_decode() {
		assert_eq!(EventId::from_raw(0xff00_0001), None);
		assert_eq!(EventId::from_raw(0x0000_0001), None);
	}

	#[test]
	fn serializes_as_raw_integer() {
		let id = EventId::new(EventKind::WindowResized, 3);
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, (0x0a00_0003u32).to_string());
		let back: EventId = serde_json::from_str(&json).unwrap();
		assert_eq!(back, id);
	}
}

use thiserror::Error;

/// Errors returned by the event registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
	/// The id names no live subscription, or its kind tag is unknown.
	#[error("event listener not found: {0:#010x}")]
	ListenerNotFound(u32),
}

pub type Result<T, E = EventError> = std::result::Result<T, E>;

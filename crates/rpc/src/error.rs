//! Error types for the RPC layer.

use std::io;
use std::sync::Arc;

use crate::message::ResponseError;

/// Errors surfaced by an endpoint.
///
/// Cloneable so a single transport failure can be reported to every
/// in-flight call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	/// Reading or writing the underlying stream failed.
	#[error("i/o error: {0}")]
	Io(#[source] Arc<io::Error>),
	/// A payload could not be encoded or decoded.
	#[error("json error: {0}")]
	Json(#[source] Arc<serde_json::Error>),
	/// The peer violated the framing or message shape.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// The peer answered with an error response.
	#[error("remote error {}: {}", .0.code, .0.message)]
	Remote(ResponseError),
	/// The endpoint shut down before the call completed.
	#[error("connection closed")]
	ConnectionClosed,
}

impl From<io::Error> for Error {
	fn from(err: io::Error) -> Self {
		Self::Io(Arc::new(err))
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Json(Arc::new(err))
	}
}

/// Result alias for RPC operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

//! JSON-RPC 2.0 message model and `Content-Length` framing.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::Inbound;
use crate::{Error, Result};

const JSONRPC_VERSION: &str = "2.0";
const CONTENT_LENGTH: &str = "content-length";
/// Largest body accepted from a peer. Longer frames are rejected before any
/// allocation.
pub const MAX_MESSAGE_LEN: usize = 8 * 1024 * 1024;

/// Request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	/// Numeric id, as generated by this crate.
	Number(i64),
	/// String id, accepted from peers.
	String(String),
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(n) => write!(f, "{n}"),
			Self::String(s) => write!(f, "{s:?}"),
		}
	}
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
	/// Numeric error code.
	pub code: i32,
	/// Human-readable message.
	pub message: String,
	/// Optional structured detail.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	/// The method does not exist.
	pub const METHOD_NOT_FOUND: i32 = -32601;
	/// Parameters failed to decode.
	pub const INVALID_PARAMS: i32 = -32602;
	/// The handler failed.
	pub const INTERNAL_ERROR: i32 = -32603;

	/// Creates an error with no data.
	pub fn new(code: i32, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	/// Error for an unhandled method.
	pub fn method_not_found(method: &str) -> Self {
		Self::new(Self::METHOD_NOT_FOUND, format!("method not found: {method}"))
	}

	/// Error for undecodable parameters.
	pub fn invalid_params(err: impl fmt::Display) -> Self {
		Self::new(Self::INVALID_PARAMS, format!("invalid params: {err}"))
	}

	/// Error for a failing handler.
	pub fn internal(err: impl fmt::Display) -> Self {
		Self::new(Self::INTERNAL_ERROR, err.to_string())
	}
}

/// Outbound or inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyRequest {
	/// Request id, unique per endpoint.
	pub id: RequestId,
	/// Method name.
	pub method: String,
	/// Parameters (`null` when absent).
	pub params: JsonValue,
}

/// Response to a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyResponse {
	/// Id of the answered request.
	pub id: RequestId,
	/// Result or error.
	pub result: std::result::Result<JsonValue, ResponseError>,
}

/// Notification; never answered.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyNotification {
	/// Method name.
	pub method: String,
	/// Parameters (`null` when absent).
	pub params: JsonValue,
}

/// A single JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	/// Request expecting a response.
	Request(AnyRequest),
	/// Response to an earlier request.
	Response(AnyResponse),
	/// Fire-and-forget notification.
	Notification(AnyNotification),
}

/// Flat wire shape; classification happens in [`Message::from_raw`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawMessage {
	jsonrpc: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<RequestId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	method: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	params: Option<JsonValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	result: Option<JsonValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	error: Option<ResponseError>,
}

impl Message {
	fn into_raw(self) -> RawMessage {
		let mut raw = RawMessage {
			jsonrpc: JSONRPC_VERSION.to_owned(),
			..RawMessage::default()
		};
		match self {
			Self::Request(req) => {
				raw.id = Some(req.id);
				raw.method = Some(req.method);
				raw.params = Some(req.params);
			}
			Self::Response(resp) => {
				raw.id = Some(resp.id);
				match resp.result {
					Ok(value) => raw.result = Some(value),
					Err(err) => raw.error = Some(err),
				}
			}
			Self::Notification(notif) => {
				raw.method = Some(notif.method);
				raw.params = Some(notif.params);
			}
		}
		raw
	}

	fn from_raw(raw: RawMessage) -> Result<Self> {
		if raw.jsonrpc != JSONRPC_VERSION {
			return Err(Error::Protocol(format!("unsupported jsonrpc version {:?}", raw.jsonrpc)));
		}
		let params = raw.params.unwrap_or(JsonValue::Null);
		match (raw.id, raw.method) {
			(Some(id), Some(method)) => Ok(Self::Request(AnyRequest { id, method, params })),
			(None, Some(method)) => Ok(Self::Notification(AnyNotification { method, params })),
			(Some(id), None) => {
				let result = match raw.error {
					Some(err) => Err(err),
					None => Ok(raw.result.unwrap_or(JsonValue::Null)),
				};
				Ok(Self::Response(AnyResponse { id, result }))
			}
			(None, None) => Err(Error::Protocol("message has neither id nor method".into())),
		}
	}

	/// Splits into the endpoint's dispatch categories.
	pub fn split(self) -> Inbound<AnyRequest, AnyResponse, AnyNotification> {
		match self {
			Self::Request(req) => Inbound::Request(req),
			Self::Response(resp) => Inbound::Response(resp),
			Self::Notification(notif) => Inbound::Notification(notif),
		}
	}

	/// Reads one framed message. Returns `Ok(None)` on a clean EOF before any header.
	pub async fn read(input: &mut (impl AsyncBufRead + Unpin)) -> Result<Option<Self>> {
		let mut line = String::new();
		let mut content_length: Option<usize> = None;
		let mut saw_header = false;
		loop {
			line.clear();
			if input.read_line(&mut line).await? == 0 {
				if saw_header {
					return Err(Error::Protocol("eof inside message header".into()));
				}
				return Ok(None);
			}
			let trimmed = line.trim_end();
			if trimmed.is_empty() {
				if saw_header {
					break;
				}
				continue;
			}
			saw_header = true;
			if let Some((name, value)) = trimmed.split_once(':')
				&& name.trim().eq_ignore_ascii_case(CONTENT_LENGTH)
			{
				let len = value.trim().parse().map_err(|_| Error::Protocol(format!("bad content length {value:?}")))?;
				content_length = Some(len);
			}
		}

		let length = content_length.ok_or_else(|| Error::Protocol("missing Content-Length".into()))?;
		if length > MAX_MESSAGE_LEN {
			return Err(Error::Protocol(format!("message too large: {length} bytes")));
		}
		let mut body = vec![0u8; length];
		input.read_exact(&mut body).await?;
		let raw: RawMessage = serde_json::from_slice(&body)?;
		Self::from_raw(raw).map(Some)
	}

	/// Writes one framed message and flushes.
	pub async fn write(self, output: &mut (impl AsyncWrite + Unpin)) -> Result<()> {
		let body = serde_json::to_vec(&self.into_raw())?;
		let header = format!("Content-Length: {}\r\n\r\n", body.len());
		output.write_all(header.as_bytes()).await?;
		output.write_all(&body).await?;
		output.flush().await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use tokio::io::BufReader;

	use super::*;

	async fn decode(bytes: &[u8]) -> Result<Option<Message>> {
		let mut reader = BufReader::new(bytes);
		Message::read(&mut reader).await
	}

	#[tokio::test]
	async fn classifies_by_id_and_method() {
		let frame = |body: &str| format!("Content-Length: {}\r\n\r\n{body}", body.len());

		let req = decode(frame(r#"{"jsonrpc":"2.0","id":1,"method":"a","params":[1]}"#).as_bytes()).await;
		assert!(matches!(req, Ok(Some(Message::Request(r))) if r.method == "a" && r.params == json!([1])));

		let notif = decode(frame(r#"{"jsonrpc":"2.0","method":"b"}"#).as_bytes()).await;
		assert!(matches!(notif, Ok(Some(Message::Notification(n))) if n.params.is_null()));

		let ok = decode(frame(r#"{"jsonrpc":"2.0","id":"x","result":null}"#).as_bytes()).await;
		assert!(matches!(ok, Ok(Some(Message::Response(r))) if r.result == Ok(JsonValue::Null)));

		let err = decode(frame(r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"m"}}"#).as_bytes()).await;
		assert!(matches!(err, Ok(Some(Message::Response(r))) if r.result.as_ref().is_err_and(|e| e.code == -32601)));
	}

	#[tokio::test]
	async fn header_name_is_case_insensitive_and_extra_headers_are_ignored() {
		let body = r#"{"jsonrpc":"2.0","method":"m"}"#;
		let bytes = format!("content-length: {}\r\nContent-Type: x\r\n\r\n{body}", body.len());
		assert!(matches!(decode(bytes.as_bytes()).await, Ok(Some(Message::Notification(_)))));
	}

	#[tokio::test]
	async fn clean_eof_and_truncated_header() {
		assert!(matches!(decode(b"").await, Ok(None)));
		assert!(matches!(decode(b"Content-Length: 4\r\n").await, Err(Error::Protocol(_))));
		assert!(matches!(decode(b"X: y\r\n\r\n{}").await, Err(Error::Protocol(_))));
	}

	#[tokio::test]
	async fn oversized_length_is_rejected_before_reading_the_body() {
		let result = decode(b"Content-Length: 200000000000\r\n\r\n{}").await;
		assert!(matches!(result, Err(Error::Protocol(m)) if m.contains("too large")));

		let just_over = format!("Content-Length: {}\r\n\r\n{{}}", MAX_MESSAGE_LEN + 1);
		assert!(matches!(decode(just_over.as_bytes()).await, Err(Error::Protocol(_))));
	}

	#[tokio::test]
	async fn written_frames_read_back() {
		let mut buf = Vec::new();
		let msg = Message::Response(AnyResponse {
			id: RequestId::Number(3),
			result: Err(ResponseError::method_not_found("nope")),
		});
		msg.clone().write(&mut buf).await.unwrap();
		assert!(buf.starts_with(b"Content-Length: "));
		assert_eq!(decode(&buf).await.unwrap(), Some(msg));
	}
}

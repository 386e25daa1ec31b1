//! JSON-RPC 2.0 plumbing shared by the plugin host and plugin processes.
//!
//! * [`Message`]: wire messages with `Content-Length` framing
//! * [`RpcClient`]: outbound half of a duplex endpoint (calls, notifications)
//! * [`RequestHandler`]: inbound half, served by the endpoint IO loop
//! * [`fingerprint`]: build-time version tag over an interface definition

#![warn(missing_docs)]

pub mod endpoint;
pub mod error;
pub mod message;
pub mod protocol;

pub use endpoint::{NoHandler, RequestHandler, RpcClient, spawn};
pub use error::{Error, Result};
pub use message::{AnyNotification, AnyRequest, AnyResponse, MAX_MESSAGE_LEN, Message, RequestId, ResponseError};
pub use protocol::{Inbound, TAG_LEN, fingerprint};

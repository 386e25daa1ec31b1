//! Duplex endpoint: one IO loop per connection serving both directions.
//!
//! The loop owns the write half and the pending-call map. A separate reader
//! task decodes frames and forwards them, so the loop's `select!` only ever
//! waits on channels. Outbound traffic is written in submission order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use futures::future::BoxFuture;
use kiln_worker::TaskClass;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};

use crate::message::{AnyNotification, AnyRequest, AnyResponse, Message, RequestId, ResponseError};
use crate::protocol::Inbound;
use crate::{Error, Result};

/// Serves requests and notifications arriving from the peer.
pub trait RequestHandler: Send + Sync + 'static {
	/// Answers one request. Each request runs on its own task.
	fn handle_request(&self, method: &str, params: JsonValue) -> BoxFuture<'static, std::result::Result<JsonValue, ResponseError>>;

	/// Handles one notification. Called inline by the IO loop, in arrival order.
	fn handle_notification(&self, method: &str, params: JsonValue);
}

/// Handler for endpoints that only make calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHandler;

impl RequestHandler for NoHandler {
	fn handle_request(&self, method: &str, _params: JsonValue) -> BoxFuture<'static, std::result::Result<JsonValue, ResponseError>> {
		let err = ResponseError::method_not_found(method);
		Box::pin(async move { Err(err) })
	}

	fn handle_notification(&self, method: &str, _params: JsonValue) {
		tracing::trace!(method, "notification ignored");
	}
}

enum Outbound {
	Request {
		request: AnyRequest,
		response_tx: oneshot::Sender<Result<JsonValue>>,
	},
	Notify(AnyNotification),
	Reply(AnyResponse),
	Close,
}

/// Cloneable handle for issuing calls over an endpoint.
#[derive(Clone)]
pub struct RpcClient {
	name: Arc<str>,
	outbound: mpsc::UnboundedSender<Outbound>,
	next_id: Arc<AtomicI64>,
}

impl std::fmt::Debug for RpcClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RpcClient")
			.field("name", &self.name)
			.field("closed", &self.is_closed())
			.finish()
	}
}

impl RpcClient {
	/// Endpoint name used in logs.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Issues a request and waits for its result.
	pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
	where
		P: Serialize,
		R: DeserializeOwned + Send + 'static,
	{
		self.call_deferred(method, params).await
	}

	/// Issues a request immediately and returns a future for its result.
	///
	/// The request is queued before this returns; dropping the future only
	/// discards the answer.
	pub fn call_deferred<P, R>(&self, method: &str, params: P) -> impl Future<Output = Result<R>> + Send + 'static
	where
		P: Serialize,
		R: DeserializeOwned + Send + 'static,
	{
		let rx = self.start_call(method, params);
		async move {
			let value = rx?.await.map_err(|_| Error::ConnectionClosed)??;
			Ok(serde_json::from_value(value)?)
		}
	}

	fn start_call(&self, method: &str, params: impl Serialize) -> Result<oneshot::Receiver<Result<JsonValue>>> {
		let params = serde_json::to_value(params)?;
		let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
		let (response_tx, response_rx) = oneshot::channel();
		let request = AnyRequest {
			id,
			method: method.to_owned(),
			params,
		};
		self.outbound
			.send(Outbound::Request { request, response_tx })
			.map_err(|_| Error::ConnectionClosed)?;
		Ok(response_rx)
	}

	/// Queues a notification.
	pub fn notify(&self, method: &str, params: impl Serialize) -> Result<()> {
		let notif = AnyNotification {
			method: method.to_owned(),
			params: serde_json::to_value(params)?,
		};
		self.outbound
			.send(Outbound::Notify(notif))
			.map_err(|_| Error::ConnectionClosed)
	}

	/// Asks the IO loop to stop after writing everything queued so far.
	///
	/// Idempotent. Calls still pending when the loop stops fail with
	/// [`Error::ConnectionClosed`].
	pub fn close(&self) {
		let _ = self.outbound.send(Outbound::Close);
	}

	/// True once the IO loop has stopped.
	pub fn is_closed(&self) -> bool {
		self.outbound.is_closed()
	}

	/// Resolves once the IO loop has stopped.
	pub async fn closed(&self) {
		self.outbound.closed().await;
	}
}

/// Starts an endpoint over `reader`/`writer` and returns its client handle.
///
/// `make_handler` receives a client for the same endpoint so handlers can
/// call back into the peer. Must be called from within a tokio runtime.
pub fn spawn<R, W, F>(name: impl Into<Arc<str>>, reader: R, writer: W, make_handler: F) -> RpcClient
where
	R: AsyncRead + Unpin + Send + 'static,
	W: AsyncWrite + Unpin + Send + 'static,
	F: FnOnce(RpcClient) -> Arc<dyn RequestHandler>,
{
	let name: Arc<str> = name.into();
	let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
	let client = RpcClient {
		name: Arc::clone(&name),
		outbound: outbound_tx.clone(),
		next_id: Arc::new(AtomicI64::new(0)),
	};
	let handler = make_handler(client.clone());

	let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
	let reader_task = kiln_worker::spawn(TaskClass::IoBlocking, "rpc.reader", read_loop(reader, inbound_tx));
	kiln_worker::spawn(TaskClass::Interactive, "rpc.io", async move {
		run_io(name, writer, inbound_rx, outbound_rx, outbound_tx, handler).await;
		reader_task.abort();
	});
	client
}

async fn read_loop<R: AsyncRead + Unpin>(reader: R, inbound_tx: mpsc::UnboundedSender<Result<Option<Message>>>) {
	let mut reader = BufReader::new(reader);
	loop {
		let msg = Message::read(&mut reader).await;
		let done = !matches!(msg, Ok(Some(_)));
		if inbound_tx.send(msg).is_err() || done {
			break;
		}
	}
}

async fn run_io<W: AsyncWrite + Unpin>(
	name: Arc<str>,
	mut writer: W,
	mut inbound_rx: mpsc::UnboundedReceiver<Result<Option<Message>>>,
	mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
	reply_tx: mpsc::UnboundedSender<Outbound>,
	handler: Arc<dyn RequestHandler>,
) {
	let mut pending: HashMap<RequestId, oneshot::Sender<Result<JsonValue>>> = HashMap::new();

	loop {
		tokio::select! {
			out = outbound_rx.recv() => {
				let Some(out) = out else { break };
				let written = match out {
					Outbound::Close => {
						tracing::debug!(endpoint = %name, "endpoint closing");
						break;
					}
					Outbound::Request { request, response_tx } => {
						let id = request.id.clone();
						match Message::Request(request).write(&mut writer).await {
							Ok(()) => {
								pending.insert(id, response_tx);
								Ok(())
							}
							Err(e) => {
								let _ = response_tx.send(Err(e.clone()));
								Err(e)
							}
						}
					}
					Outbound::Notify(notif) => Message::Notification(notif).write(&mut writer).await,
					Outbound::Reply(resp) => Message::Response(resp).write(&mut writer).await,
				};
				if let Err(e) = written {
					tracing::warn!(endpoint = %name, error = %e, "outbound write failed; stopping endpoint");
					break;
				}
			}

			msg = inbound_rx.recv() => match msg {
				Some(Ok(Some(msg))) => dispatch_inbound(&name, msg, &mut pending, &reply_tx, &handler),
				Some(Ok(None)) | None => {
					tracing::debug!(endpoint = %name, "peer closed connection");
					break;
				}
				Some(Err(e)) => {
					tracing::warn!(endpoint = %name, error = %e, "failed to read from peer");
					break;
				}
			},
		}
	}

	for (_, tx) in pending.drain() {
		let _ = tx.send(Err(Error::ConnectionClosed));
	}
	outbound_rx.close();
	while let Ok(out) = outbound_rx.try_recv() {
		if let Outbound::Request { response_tx, .. } = out {
			let _ = response_tx.send(Err(Error::ConnectionClosed));
		}
	}
	let _ = writer.shutdown().await;
}

fn dispatch_inbound(
	name: &str,
	msg: Message,
	pending: &mut HashMap<RequestId, oneshot::Sender<Result<JsonValue>>>,
	reply_tx: &mpsc::UnboundedSender<Outbound>,
	handler: &Arc<dyn RequestHandler>,
) {
	match msg.split() {
		Inbound::Request(req) => {
			tracing::trace!(endpoint = name, id = %req.id, method = %req.method, "inbound request");
			let fut = handler.handle_request(&req.method, req.params);
			let reply_tx = reply_tx.clone();
			let id = req.id;
			kiln_worker::spawn(TaskClass::Background, "rpc.request", async move {
				let result = fut.await;
				let _ = reply_tx.send(Outbound::Reply(AnyResponse { id, result }));
			});
		}
		Inbound::Response(resp) => match pending.remove(&resp.id) {
			Some(tx) => {
				let _ = tx.send(resp.result.map_err(Error::Remote));
			}
			None => tracing::warn!(endpoint = name, id = %resp.id, "response for unknown request"),
		},
		Inbound::Notification(notif) => {
			tracing::trace!(endpoint = name, method = %notif.method, "inbound notification");
			handler.handle_notification(&notif.method, notif.params);
		}
	}
}

#[cfg(test)]
mod tests;

//! Plugin-side runtime.
//!
//! A plugin binary implements [`Plugin`] and calls [`main`]. The runtime
//! refuses to run outside the host, writes the version tag as the very first
//! bytes on stdout, then serves the host over stdin/stdout until the host
//! closes the connection.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use kiln_events::{EventId, EventKind, EventPayload};
use kiln_primitives::{KeyboardMode, WindowId};
use kiln_rpc::{RequestHandler, ResponseError, RpcClient};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::api::{self, DispatchParams, EditorDetails, PluginDetails, StartParams, SubscribeParams, SubscribeResult, UnsubscribeParams};

/// Time allowed for in-flight work once the host has gone away.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Behavior of a plugin process.
pub trait Plugin: Send + Sync + 'static {
	fn details(&self) -> PluginDetails;

	/// Called once the host has sent its details.
	fn init(&self, editor: &EditorProxy) {
		let _ = editor;
	}

	/// Called for every event the plugin subscribed to.
	fn on_event(&self, id: EventId, event: &EventPayload) {
		let _ = (id, event);
	}

	/// Called when the host asks the plugin to quit.
	fn close(&self) {}
}

/// The plugin's handle on the editor, backed by calls to the host.
#[derive(Clone)]
pub struct EditorProxy {
	client: RpcClient,
	details: Arc<RwLock<EditorDetails>>,
}

impl EditorProxy {
	/// Editor id received in `plugin.on_start`.
	pub fn id(&self) -> String {
		self.details.read().id.clone()
	}

	/// Editor version received in `plugin.on_start`.
	pub fn version(&self) -> String {
		self.details.read().version.clone()
	}

	pub async fn subscribe(&self, kind: EventKind) -> kiln_rpc::Result<EventId> {
		let result: SubscribeResult = self.client.call(api::EVENTS_SUBSCRIBE, SubscribeParams { kind }).await?;
		Ok(result.id)
	}

	pub async fn unsubscribe(&self, id: EventId) -> kiln_rpc::Result<()> {
		self.client.call(api::EVENTS_UNSUBSCRIBE, UnsubscribeParams { id }).await
	}

	pub async fn active_window(&self) -> kiln_rpc::Result<WindowId> {
		self.client.call(api::EDITOR_ACTIVE_WINDOW, ()).await
	}

	pub async fn view_factory_names(&self) -> kiln_rpc::Result<Vec<String>> {
		self.client.call(api::EDITOR_VIEW_FACTORY_NAMES, ()).await
	}

	pub async fn keyboard_mode(&self) -> kiln_rpc::Result<KeyboardMode> {
		self.client.call(api::EDITOR_KEYBOARD_MODE, ()).await
	}

	pub async fn editor_details(&self) -> kiln_rpc::Result<EditorDetails> {
		self.client.call(api::EDITOR_DETAILS, ()).await
	}
}

struct GuestHandler {
	plugin: Arc<dyn Plugin>,
	proxy: EditorProxy,
}

impl GuestHandler {
	fn answer(&self, method: &str, params: JsonValue) -> Result<JsonValue, ResponseError> {
		match method {
			api::GET_INFO => serde_json::to_value(self.plugin.details()).map_err(ResponseError::internal),
			api::ON_START => {
				let start: StartParams = decode(params)?;
				*self.proxy.details.write() = EditorDetails {
					id: start.editor_id,
					version: start.editor_version,
				};
				self.plugin.init(&self.proxy);
				Ok(JsonValue::Null)
			}
			api::QUIT => {
				self.plugin.close();
				Ok(JsonValue::Null)
			}
			_ => Err(ResponseError::method_not_found(method)),
		}
	}
}

impl RequestHandler for GuestHandler {
	fn handle_request(&self, method: &str, params: JsonValue) -> BoxFuture<'static, Result<JsonValue, ResponseError>> {
		futures::future::ready(self.answer(method, params)).boxed()
	}

	fn handle_notification(&self, method: &str, params: JsonValue) {
		if method != api::EVENTS_DISPATCH {
			return;
		}
		match decode::<DispatchParams>(params) {
			Ok(dispatch) => self.plugin.on_event(dispatch.id, &dispatch.event),
			Err(e) => tracing::debug!(error = %e.message, "malformed event dispatch"),
		}
	}
}

fn decode<T: DeserializeOwned>(params: JsonValue) -> Result<T, ResponseError> {
	serde_json::from_value(params).map_err(ResponseError::invalid_params)
}

/// Errors that end the guest runtime.
#[derive(Debug, thiserror::Error)]
pub enum GuestError {
	#[error("this is a kiln plugin; it is only meant to be started by kiln itself")]
	NotUnderHost,
	#[error("failed to write version tag: {0}")]
	Handshake(#[from] std::io::Error),
}

/// Writes the version tag to `writer` and serves `plugin` until the host
/// closes the connection.
pub async fn serve<R, W>(plugin: Arc<dyn Plugin>, reader: R, mut writer: W) -> Result<(), GuestError>
where
	R: AsyncRead + Unpin + Send + 'static,
	W: AsyncWrite + Unpin + Send + 'static,
{
	writer.write_all(&api::PROTOCOL_VERSION).await?;
	writer.flush().await?;

	let client = kiln_rpc::spawn("host", reader, writer, |client| {
		Arc::new(GuestHandler {
			plugin,
			proxy: EditorProxy {
				client,
				details: Arc::default(),
			},
		}) as Arc<dyn RequestHandler>
	});
	client.closed().await;
	Ok(())
}

/// True when the process was started by the host.
pub fn started_by_host() -> bool {
	std::env::var(api::PLUGIN_ENV).is_ok_and(|v| v == api::PLUGIN_ENV_VALUE)
}

/// Runs `plugin` over stdin/stdout on a fresh runtime.
pub fn main(plugin: impl Plugin) -> ExitCode {
	if !started_by_host() {
		eprintln!("{}", GuestError::NotUnderHost);
		return ExitCode::FAILURE;
	}
	let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
		Ok(runtime) => runtime,
		Err(e) => {
			eprintln!("failed to start runtime: {e}");
			return ExitCode::FAILURE;
		}
	};
	let result = runtime.block_on(serve(Arc::new(plugin), tokio::io::stdin(), tokio::io::stdout()));
	// The blocking stdin reader never returns on its own.
	runtime.shutdown_timeout(SHUTDOWN_GRACE);
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{e}");
			ExitCode::FAILURE
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use kiln_events::{ViewCreated, WindowCreated};
	use kiln_primitives::ViewId;
	use kiln_rpc::TAG_LEN;
	use tokio::io::AsyncReadExt;

	use super::*;

	#[derive(Default)]
	struct Probe {
		events: AtomicUsize,
		closed: AtomicUsize,
	}

	impl Plugin for Arc<Probe> {
		fn details(&self) -> PluginDetails {
			PluginDetails {
				name: "probe".into(),
				description: "test plugin".into(),
			}
		}

		fn on_event(&self, _id: EventId, _event: &EventPayload) {
			self.events.fetch_add(1, Ordering::SeqCst);
		}

		fn close(&self) {
			self.closed.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[tokio::test]
	async fn serves_details_events_and_quit() {
		let (host_io, guest_io) = tokio::io::duplex(4096);
		let (guest_r, guest_w) = tokio::io::split(guest_io);
		let (mut host_r, host_w) = tokio::io::split(host_io);
		let probe = Arc::new(Probe::default());
		let guest = tokio::spawn(serve(Arc::new(Arc::clone(&probe)), guest_r, guest_w));

		let mut tag = [0u8; TAG_LEN];
		host_r.read_exact(&mut tag).await.unwrap();
		assert_eq!(tag, api::PROTOCOL_VERSION);

		let host = kiln_rpc::spawn("guest", host_r, host_w, |_| Arc::new(kiln_rpc::NoHandler));
		let details: PluginDetails = host.call(api::GET_INFO, ()).await.unwrap();
		assert_eq!(details.name, "probe");

		let start = StartParams {
			editor_id: "e".into(),
			editor_version: "v".into(),
		};
		host.call::<_, ()>(api::ON_START, start).await.unwrap();

		let view = EventPayload::ViewCreated(ViewCreated { view: ViewId(1) });
		let window = EventPayload::WindowCreated(WindowCreated { window: WindowId(2) });
		for event in [view, window] {
			let id = EventId::from_raw((u32::from(event.kind().tag()) << 24) | 1).unwrap();
			host.notify(api::EVENTS_DISPATCH, DispatchParams { id, event }).unwrap();
		}
		host.call::<_, ()>(api::QUIT, ()).await.unwrap();
		assert_eq!(probe.events.load(Ordering::SeqCst), 2);
		assert_eq!(probe.closed.load(Ordering::SeqCst), 1);

		host.close();
		guest.await.unwrap().unwrap();
	}
}

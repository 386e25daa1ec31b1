//! Host side of the plugin connection: answers plugin calls into the editor
//! and forwards subscribed bus events as `events.dispatch` notifications.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use futures::FutureExt;
use futures::future::BoxFuture;
use kiln_events::{EventBus, EventId};
use kiln_primitives::{KeyboardMode, WindowId};
use kiln_rpc::{RequestHandler, ResponseError, RpcClient};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::api::{self, DispatchParams, EditorDetails, SubscribeParams, SubscribeResult, UnsubscribeParams};

/// Read-only view of editor state published by the control loop after each
/// step. Plugin requests are answered from the latest snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorSnapshot {
	pub editor_id: String,
	pub editor_version: String,
	pub active_window: WindowId,
	pub view_factory_names: Vec<String>,
	pub keyboard_mode: KeyboardMode,
}

/// Shared state every plugin connection answers from.
#[derive(Clone)]
pub struct HostBridge {
	bus: EventBus,
	snapshot: Arc<ArcSwap<EditorSnapshot>>,
}

impl HostBridge {
	pub fn new(bus: EventBus, snapshot: EditorSnapshot) -> Self {
		Self {
			bus,
			snapshot: Arc::new(ArcSwap::from_pointee(snapshot)),
		}
	}

	pub fn bus(&self) -> &EventBus {
		&self.bus
	}

	pub fn snapshot(&self) -> Arc<EditorSnapshot> {
		self.snapshot.load_full()
	}

	/// Replaces the snapshot seen by plugins.
	pub fn publish_snapshot(&self, snapshot: EditorSnapshot) {
		self.snapshot.store(Arc::new(snapshot));
	}

	pub(crate) fn connect(&self, client: RpcClient) -> Arc<PluginConnection> {
		Arc::new(PluginConnection {
			bridge: self.clone(),
			client,
			subscriptions: Mutex::new(Subscriptions::default()),
		})
	}
}

/// Bus ids held by one plugin. Once closed, no new ids are accepted.
#[derive(Default)]
struct Subscriptions {
	ids: Vec<EventId>,
	closed: bool,
}

/// Per-plugin request handler. Owns the bus subscriptions made by its plugin.
pub(crate) struct PluginConnection {
	bridge: HostBridge,
	client: RpcClient,
	subscriptions: Mutex<Subscriptions>,
}

impl PluginConnection {
	fn subscribe(&self, params: SubscribeParams) -> Result<SubscribeResult, ResponseError> {
		// Held across registration so a concurrent release cannot miss the id.
		let mut owned = self.subscriptions.lock();
		if owned.closed {
			return Err(ResponseError::internal("plugin connection closed"));
		}
		let client = self.client.clone();
		let assigned: Arc<OnceLock<EventId>> = Arc::default();
		let cell = Arc::clone(&assigned);
		let id = self.bridge.bus.register_payload(params.kind, move |event| {
			if let Some(&id) = cell.get() {
				let params = DispatchParams { id, event: event.clone() };
				if let Err(e) = client.notify(api::EVENTS_DISPATCH, params) {
					tracing::trace!(plugin = client.name(), error = %e, "event dispatch dropped");
				}
			}
			true
		});
		let _ = assigned.set(id);
		owned.ids.push(id);
		drop(owned);
		tracing::debug!(plugin = self.client.name(), id = %id, "plugin subscribed");
		Ok(SubscribeResult { id })
	}

	fn unsubscribe(&self, params: UnsubscribeParams) -> Result<(), ResponseError> {
		let mut owned = self.subscriptions.lock();
		let Some(index) = owned.ids.iter().position(|id| *id == params.id) else {
			return Err(ResponseError::internal(kiln_events::EventError::ListenerNotFound(params.id.to_raw())));
		};
		owned.ids.remove(index);
		drop(owned);
		self.bridge.bus.unregister(params.id).map_err(ResponseError::internal)
	}

	/// Unregisters every subscription this plugin still holds and refuses
	/// later ones.
	pub(crate) fn release(&self) {
		let owned = {
			let mut subscriptions = self.subscriptions.lock();
			subscriptions.closed = true;
			std::mem::take(&mut subscriptions.ids)
		};
		for id in owned {
			if let Err(e) = self.bridge.bus.unregister(id) {
				tracing::debug!(plugin = self.client.name(), error = %e, "stale plugin subscription");
			}
		}
	}

	pub(crate) fn subscription_count(&self) -> usize {
		self.subscriptions.lock().ids.len()
	}

	fn answer(&self, method: &str, params: JsonValue) -> Result<JsonValue, ResponseError> {
		let snapshot = self.bridge.snapshot.load();
		match method {
			api::EVENTS_SUBSCRIBE => to_json(self.subscribe(decode(params)?)?),
			api::EVENTS_UNSUBSCRIBE => {
				self.unsubscribe(decode(params)?)?;
				Ok(JsonValue::Null)
			}
			api::EDITOR_ACTIVE_WINDOW => to_json(snapshot.active_window),
			api::EDITOR_VIEW_FACTORY_NAMES => to_json(&snapshot.view_factory_names),
			api::EDITOR_KEYBOARD_MODE => to_json(snapshot.keyboard_mode),
			api::EDITOR_DETAILS => to_json(EditorDetails {
				id: snapshot.editor_id.clone(),
				version: snapshot.editor_version.clone(),
			}),
			_ => Err(ResponseError::method_not_found(method)),
		}
	}
}

impl RequestHandler for PluginConnection {
	fn handle_request(&self, method: &str, params: JsonValue) -> BoxFuture<'static, Result<JsonValue, ResponseError>> {
		futures::future::ready(self.answer(method, params)).boxed()
	}

	fn handle_notification(&self, method: &str, _params: JsonValue) {
		tracing::debug!(plugin = self.client.name(), method, "unexpected notification from plugin");
	}
}

fn decode<T: DeserializeOwned>(params: JsonValue) -> Result<T, ResponseError> {
	serde_json::from_value(params).map_err(ResponseError::invalid_params)
}

fn to_json(value: impl Serialize) -> Result<JsonValue, ResponseError> {
	serde_json::to_value(value).map_err(ResponseError::internal)
}

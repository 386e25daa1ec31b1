//! Wire surface shared by the host and plugin processes.
//!
//! Both sides link this module, so the version tag derived from
//! [`INTERFACE`] matches exactly when they were built from the same
//! definition.

use kiln_events::{EventId, EventKind, EventPayload};
use kiln_rpc::{TAG_LEN, fingerprint};
use serde::{Deserialize, Serialize};

/// Environment variable that marks a process as started by the host.
pub const PLUGIN_ENV: &str = "KILN";
/// Expected value of [`PLUGIN_ENV`].
pub const PLUGIN_ENV_VALUE: &str = "plugin";
/// File name prefix of discoverable plugins.
pub const PLUGIN_PREFIX: &str = "kiln-plugin-";

// Host to plugin.
pub const GET_INFO: &str = "plugin.get_info";
pub const ON_START: &str = "plugin.on_start";
pub const QUIT: &str = "plugin.quit";
pub const EVENTS_DISPATCH: &str = "events.dispatch";

// Plugin to host.
pub const EVENTS_SUBSCRIBE: &str = "events.subscribe";
pub const EVENTS_UNSUBSCRIBE: &str = "events.unsubscribe";
pub const EDITOR_ACTIVE_WINDOW: &str = "editor.active_window";
pub const EDITOR_VIEW_FACTORY_NAMES: &str = "editor.view_factory_names";
pub const EDITOR_KEYBOARD_MODE: &str = "editor.keyboard_mode";
pub const EDITOR_DETAILS: &str = "editor.details";

/// Canonical interface definition. Any change here changes the version tag.
pub const INTERFACE: &str = "\
plugin.get_info() -> {name: string, description: string}
plugin.on_start({editor_id: string, editor_version: string}) -> null
plugin.quit() -> null
events.dispatch!({id: u32, event: EventPayload})
events.subscribe({kind: EventKind}) -> {id: u32}
events.unsubscribe({id: u32}) -> null
editor.active_window() -> u32
editor.view_factory_names() -> [string]
editor.keyboard_mode() -> KeyboardMode
editor.details() -> {id: string, version: string}
";

/// Version tag written by a plugin before anything else on stdout.
pub const PROTOCOL_VERSION: [u8; TAG_LEN] = fingerprint(INTERFACE);

/// Tag as text, for diagnostics.
pub fn protocol_version() -> String {
	String::from_utf8_lossy(&PROTOCOL_VERSION).into_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDetails {
	pub name: String,
	pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartParams {
	pub editor_id: String,
	pub editor_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorDetails {
	pub id: String,
	pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeParams {
	pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeResult {
	pub id: EventId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeParams {
	pub id: EventId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchParams {
	pub id: EventId,
	pub event: EventPayload,
}

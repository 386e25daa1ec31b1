//! Out-of-process plugins.
//!
//! The host side discovers plugin command lines ([`discovery`]), spawns each
//! one as a child process and races a version handshake against early stderr
//! output ([`PluginChannel`]), then talks JSON-RPC over the child's stdio.
//! [`PluginManager`] owns every live channel. [`HostBridge`] answers the
//! plugin's calls into the editor and forwards bus events it subscribed to.
//!
//! The guest side ([`guest`]) is what a plugin binary links: it checks the
//! environment marker, writes the version tag and serves the host.

pub mod api;
mod channel;
pub mod discovery;
mod error;
pub mod guest;
mod handshake;
mod host;
mod manager;

pub use channel::{ChannelOptions, ChannelState, PluginChannel};
pub use error::{LoadFailure, PluginError, PluginLoadError, Result, UnloadError};
pub use host::{EditorSnapshot, HostBridge};
pub use manager::{PluginManager, load_all};

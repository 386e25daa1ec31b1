//! One live plugin process and its RPC connection.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use kiln_rpc::{RequestHandler, RpcClient};
use kiln_worker::TaskClass;
use tokio::process::{Child, Command};

use crate::api::{self, PluginDetails, StartParams};
use crate::host::{HostBridge, PluginConnection};
use crate::{PluginError, Result, handshake};

/// Grace period for the child to exit after it was killed.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Lifecycle of a [`PluginChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
	Spawned,
	HandshakeInFlight,
	Live,
	Failed,
	Closed,
}

/// Tunables applied to every spawned plugin.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
	/// `None` waits for the handshake indefinitely.
	pub handshake_timeout: Option<Duration>,
	/// Upper bound on the best-effort `plugin.quit` call during close.
	pub quit_timeout: Duration,
}

impl Default for ChannelOptions {
	fn default() -> Self {
		Self {
			handshake_timeout: None,
			quit_timeout: Duration::from_secs(1),
		}
	}
}

/// A plugin child process with a live JSON-RPC connection.
///
/// Owned by the [`PluginManager`](crate::PluginManager). Dropping it kills the
/// process; [`close`](Self::close) does so politely first.
pub struct PluginChannel {
	command: Vec<String>,
	label: Arc<str>,
	pid: Option<u32>,
	details: PluginDetails,
	state: ChannelState,
	child: Option<Child>,
	client: Option<RpcClient>,
	connection: Option<Arc<PluginConnection>>,
	initialized: Arc<AtomicBool>,
	quit_timeout: Duration,
}

impl std::fmt::Debug for PluginChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PluginChannel")
			.field("name", &self.details.name)
			.field("pid", &self.pid)
			.field("state", &self.state)
			.field("initialized", &self.is_initialized())
			.finish_non_exhaustive()
	}
}

impl PluginChannel {
	/// Starts `command`, completes the handshake, fetches the plugin details
	/// and issues `plugin.on_start` without waiting for it.
	pub async fn spawn(command: Vec<String>, options: &ChannelOptions, host: &HostBridge) -> Result<Self> {
		let (program, args) = command.split_first().ok_or(PluginError::EmptyCommand)?;
		tracing::debug!(command = ?command, "loading plugin");

		let mut child = Command::new(program)
			.args(args)
			.env(api::PLUGIN_ENV, api::PLUGIN_ENV_VALUE)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(PluginError::Spawn)?;

		let pid = child.id();
		let stdin = child.stdin.take().ok_or(PluginError::MissingPipe("stdin"))?;
		let stdout = child.stdout.take().ok_or(PluginError::MissingPipe("stdout"))?;
		let stderr = child.stderr.take().ok_or(PluginError::MissingPipe("stderr"))?;
		let label: Arc<str> = Arc::from(format!("{}[{}]", program, pid.unwrap_or_default()));

		let mut channel = Self {
			command: command.clone(),
			label: Arc::clone(&label),
			pid,
			details: PluginDetails {
				name: "<unknown>".into(),
				description: String::new(),
			},
			state: ChannelState::Spawned,
			child: Some(child),
			client: None,
			connection: None,
			initialized: Arc::new(AtomicBool::new(false)),
			quit_timeout: options.quit_timeout,
		};

		channel.set_state(ChannelState::HandshakeInFlight);
		let stdout = match handshake::run(Arc::clone(&label), stdout, stderr, options.handshake_timeout).await {
			Ok(stdout) => stdout,
			Err(e) => return Err(channel.fail(e).await),
		};

		let mut connection = None;
		let client = kiln_rpc::spawn(Arc::clone(&label), stdout, stdin, |client| {
			let conn = host.connect(client);
			connection = Some(Arc::clone(&conn));
			conn as Arc<dyn RequestHandler>
		});
		channel.client = Some(client.clone());
		channel.connection = connection;

		match client.call::<_, PluginDetails>(api::GET_INFO, ()).await {
			Ok(details) => channel.details = details,
			Err(e) => return Err(channel.fail(e.into()).await),
		}
		channel.set_state(ChannelState::Live);
		tracing::info!(plugin = %channel.details.name, pid = ?pid, "plugin is now functional");

		let snapshot = host.snapshot();
		let start = client.call_deferred::<_, ()>(
			api::ON_START,
			StartParams {
				editor_id: snapshot.editor_id.clone(),
				editor_version: snapshot.editor_version.clone(),
			},
		);
		let initialized = Arc::clone(&channel.initialized);
		kiln_worker::spawn(TaskClass::Background, "plugin.on_start", async move {
			match start.await {
				Ok(()) => initialized.store(true, Ordering::Release),
				Err(e) => tracing::warn!(plugin = %label, error = %e, "plugin on_start failed"),
			}
		});

		Ok(channel)
	}

	pub fn name(&self) -> &str {
		&self.details.name
	}

	pub fn details(&self) -> &PluginDetails {
		&self.details
	}

	pub fn command(&self) -> &[String] {
		&self.command
	}

	/// OS process id, kept after the process is gone.
	pub fn pid(&self) -> Option<u32> {
		self.pid
	}

	pub fn state(&self) -> ChannelState {
		self.state
	}

	/// True once `plugin.on_start` has completed successfully.
	pub fn is_initialized(&self) -> bool {
		self.initialized.load(Ordering::Acquire)
	}

	pub fn client(&self) -> Option<&RpcClient> {
		self.client.as_ref()
	}

	/// Best-effort `plugin.quit`, then closes the transport and kills the process.
	///
	/// Idempotent. Bus subscriptions made by the plugin are released.
	pub async fn close(&mut self) -> Result<()> {
		if self.state == ChannelState::Closed {
			return Ok(());
		}
		if let Some(client) = self.client.take() {
			match tokio::time::timeout(self.quit_timeout, client.call::<_, ()>(api::QUIT, ())).await {
				Ok(Ok(())) => {}
				Ok(Err(e)) => tracing::debug!(plugin = %self.label, error = %e, "plugin quit failed"),
				Err(_) => tracing::debug!(plugin = %self.label, "plugin quit timed out"),
			}
			client.close();
		}
		if let Some(connection) = self.connection.take() {
			connection.release();
		}
		let result = self.kill().await;
		self.set_state(ChannelState::Closed);
		tracing::debug!(plugin = %self.details.name, pid = ?self.pid, "plugin closed");
		result
	}

	async fn fail(&mut self, error: PluginError) -> PluginError {
		self.set_state(ChannelState::Failed);
		if let Some(client) = self.client.take() {
			client.close();
		}
		if let Some(connection) = self.connection.take() {
			connection.release();
		}
		if let Err(e) = self.kill().await {
			tracing::debug!(plugin = %self.label, error = %e, "failed to stop plugin after load failure");
		}
		error
	}

	async fn kill(&mut self) -> Result<()> {
		let Some(mut child) = self.child.take() else {
			return Ok(());
		};
		if let Ok(Some(_)) = child.try_wait() {
			return Ok(());
		}
		if let Err(source) = child.start_kill() {
			return Err(PluginError::Kill {
				pid: self.pid.unwrap_or_default(),
				source,
			});
		}
		let _ = tokio::time::timeout(REAP_TIMEOUT, child.wait()).await;
		Ok(())
	}

	fn set_state(&mut self, state: ChannelState) {
		tracing::trace!(plugin = %self.label, from = ?self.state, to = ?state, "plugin state");
		self.state = state;
	}
}

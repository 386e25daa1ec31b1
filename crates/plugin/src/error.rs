use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single plugin operation.
#[derive(Debug, Error)]
pub enum PluginError {
	#[error("empty plugin command line")]
	EmptyCommand,
	#[error("failed to start process: {0}")]
	Spawn(#[source] io::Error),
	#[error("failed to capture plugin {0}")]
	MissingPipe(&'static str),
	#[error("plugin wrote to stderr during handshake: {0}")]
	EarlyStderr(String),
	#[error("unexpected protocol version; expected {expected}, got {actual}")]
	VersionMismatch { expected: String, actual: String },
	#[error("plugin closed stdout before sending its version")]
	HandshakeEof,
	#[error("no handshake within {0:?}")]
	HandshakeTimeout(Duration),
	#[error("handshake read failed: {0}")]
	HandshakeIo(#[source] io::Error),
	#[error("failed to stop process {pid}: {source}")]
	Kill {
		pid: u32,
		#[source]
		source: io::Error,
	},
	#[error("load task failed: {0}")]
	LoadTask(#[source] tokio::task::JoinError),
	#[error(transparent)]
	Rpc(#[from] kiln_rpc::Error),
}

pub type Result<T, E = PluginError> = std::result::Result<T, E>;

/// One candidate that failed to load.
#[derive(Debug)]
pub struct LoadFailure {
	pub command: Vec<String>,
	pub error: PluginError,
}

impl fmt::Display for LoadFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "failed to load [{}]: {}", self.command.join(" "), self.error)
	}
}

/// Combined failures of a concurrent load, one line per candidate.
#[derive(Debug, Error)]
pub struct PluginLoadError {
	pub failures: Vec<LoadFailure>,
}

impl fmt::Display for PluginLoadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, failure) in self.failures.iter().enumerate() {
			if i > 0 {
				f.write_str("\n")?;
			}
			write!(f, "{failure}")?;
		}
		Ok(())
	}
}

/// Failures collected while closing every plugin.
#[derive(Debug, Error)]
pub struct UnloadError {
	pub failures: Vec<(String, PluginError)>,
}

impl fmt::Display for UnloadError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, (name, error)) in self.failures.iter().enumerate() {
			if i > 0 {
				f.write_str("\n")?;
			}
			write!(f, "failed to close {name}: {error}")?;
		}
		Ok(())
	}
}

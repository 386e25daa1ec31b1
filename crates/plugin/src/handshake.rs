//! Version handshake race.
//!
//! Two readers start together: one reads exactly the tag length from stdout
//! and compares it with [`PROTOCOL_VERSION`], the other fails the handshake
//! on the first bytes seen on stderr. A single-slot signal records whichever
//! finishes first; later completions are no-ops.

use std::sync::Arc;
use std::time::Duration;

use kiln_rpc::TAG_LEN;
use kiln_worker::TaskClass;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;

use crate::api::PROTOCOL_VERSION;
use crate::{PluginError, Result};

const STDERR_CHUNK: usize = 2048;

/// First-writer-wins completion signal.
pub(crate) struct HandshakeSlot(Mutex<Option<oneshot::Sender<Result<()>>>>);

impl HandshakeSlot {
	pub(crate) fn new() -> (Arc<Self>, oneshot::Receiver<Result<()>>) {
		let (tx, rx) = oneshot::channel();
		(Arc::new(Self(Mutex::new(Some(tx)))), rx)
	}

	/// Records `outcome` if nothing has been recorded yet. Returns whether it won.
	pub(crate) fn complete(&self, outcome: Result<()>) -> bool {
		match self.0.lock().take() {
			Some(tx) => {
				let _ = tx.send(outcome);
				true
			}
			None => false,
		}
	}
}

/// Runs the race over the child's pipes and hands stdout back on success.
///
/// The stderr reader keeps running after the handshake and logs whatever
/// the plugin writes there as diagnostics.
pub(crate) async fn run<O, E>(label: Arc<str>, stdout: O, stderr: E, timeout: Option<Duration>) -> Result<O>
where
	O: AsyncRead + Unpin + Send + 'static,
	E: AsyncRead + Unpin + Send + 'static,
{
	let (slot, done) = HandshakeSlot::new();
	let stdout_task = kiln_worker::spawn(TaskClass::IoBlocking, "plugin.stdout", read_tag(stdout, Arc::clone(&slot)));
	kiln_worker::spawn(TaskClass::IoBlocking, "plugin.stderr", watch_stderr(label, stderr, slot));

	let outcome = match timeout {
		Some(limit) => match tokio::time::timeout(limit, done).await {
			Ok(received) => received.unwrap_or(Err(PluginError::HandshakeEof)),
			Err(_) => Err(PluginError::HandshakeTimeout(limit)),
		},
		None => done.await.unwrap_or(Err(PluginError::HandshakeEof)),
	};

	if let Err(e) = outcome {
		stdout_task.abort();
		return Err(e);
	}
	stdout_task.await.map_err(|_| PluginError::MissingPipe("stdout"))
}

async fn read_tag<O: AsyncRead + Unpin>(mut stdout: O, slot: Arc<HandshakeSlot>) -> O {
	let mut tag = [0u8; TAG_LEN];
	let outcome = match stdout.read_exact(&mut tag).await {
		Ok(_) if tag == PROTOCOL_VERSION => Ok(()),
		Ok(_) => Err(PluginError::VersionMismatch {
			expected: String::from_utf8_lossy(&PROTOCOL_VERSION).into_owned(),
			actual: String::from_utf8_lossy(&tag).into_owned(),
		}),
		Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(PluginError::HandshakeEof),
		Err(e) => Err(PluginError::HandshakeIo(e)),
	};
	slot.complete(outcome);
	stdout
}

async fn watch_stderr<E: AsyncRead + Unpin>(label: Arc<str>, mut stderr: E, slot: Arc<HandshakeSlot>) {
	let mut buf = vec![0u8; STDERR_CHUNK];
	loop {
		let n = match stderr.read(&mut buf).await {
			Ok(0) => break,
			Ok(n) => n,
			Err(e) => {
				tracing::debug!(plugin = %label, error = %e, "plugin stderr read failed");
				break;
			}
		};
		let text = String::from_utf8_lossy(&buf[..n]).into_owned();
		if slot.complete(Err(PluginError::EarlyStderr(one_line(&text)))) {
			continue;
		}
		for line in text.lines().filter(|l| !l.trim().is_empty()) {
			tracing::warn!(plugin = %label, "{line}");
		}
	}
}

/// Folds multi-line stderr output into a single line for error messages.
fn one_line(text: &str) -> String {
	text.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.collect::<Vec<_>>()
		.join("; ")
}

#[cfg(test)]
mod tests {
	use tokio::io::AsyncWriteExt;

	use super::*;

	fn label() -> Arc<str> {
		Arc::from("test")
	}

	#[tokio::test]
	async fn matching_tag_wins_and_returns_stdout() {
		let (mut out_w, out_r) = tokio::io::duplex(64);
		let (_err_w, err_r) = tokio::io::duplex(64);
		out_w.write_all(&PROTOCOL_VERSION).await.unwrap();
		out_w.write_all(b"rest").await.unwrap();

		let mut stdout = run(label(), out_r, err_r, None).await.unwrap();
		let mut rest = [0u8; 4];
		stdout.read_exact(&mut rest).await.unwrap();
		assert_eq!(&rest, b"rest");
	}

	#[tokio::test]
	async fn wrong_tag_is_a_version_mismatch() {
		let (mut out_w, out_r) = tokio::io::duplex(64);
		let (_err_w, err_r) = tokio::io::duplex(64);
		out_w.write_all(&[b'0'; TAG_LEN]).await.unwrap();

		let err = run(label(), out_r, err_r, None).await.unwrap_err();
		assert!(matches!(err, PluginError::VersionMismatch { actual, .. } if actual == "0000000000000000"));
	}

	#[tokio::test]
	async fn early_stderr_fails_the_handshake() {
		let (_out_w, out_r) = tokio::io::duplex(64);
		let (mut err_w, err_r) = tokio::io::duplex(64);
		err_w.write_all(b"boom\n").await.unwrap();

		let err = run(label(), out_r, err_r, None).await.unwrap_err();
		assert!(matches!(err, PluginError::EarlyStderr(text) if text == "boom"));
	}

	#[tokio::test]
	async fn multi_line_stderr_is_joined() {
		let (_out_w, out_r) = tokio::io::duplex(64);
		let (mut err_w, err_r) = tokio::io::duplex(256);
		err_w.write_all(b"panicked at src/main.rs:3\n\n  note: run with RUST_BACKTRACE=1\r\n").await.unwrap();

		let err = run(label(), out_r, err_r, None).await.unwrap_err();
		assert_eq!(
			err.to_string(),
			"plugin wrote to stderr during handshake: panicked at src/main.rs:3; note: run with RUST_BACKTRACE=1"
		);
	}

	#[tokio::test(start_paused = true)]
	async fn silent_plugin_times_out() {
		let (_out_w, out_r) = tokio::io::duplex(64);
		let (_err_w, err_r) = tokio::io::duplex(64);

		let err = run(label(), out_r, err_r, Some(Duration::from_secs(2))).await.unwrap_err();
		assert!(matches!(err, PluginError::HandshakeTimeout(d) if d == Duration::from_secs(2)));
	}

	#[test]
	fn only_first_completion_is_recorded() {
		let (slot, mut done) = HandshakeSlot::new();
		assert!(slot.complete(Ok(())));
		assert!(!slot.complete(Err(PluginError::HandshakeEof)));
		assert!(matches!(done.try_recv(), Ok(Ok(()))));
	}
}

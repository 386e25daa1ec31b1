//! Tracing setup for the kiln binary.
//!
//! The editor owns the terminal, so it never logs to stderr. Logs go to
//! `$KILN_LOG_DIR/kiln.<pid>.log` when that variable is set, otherwise to the
//! platform state (or cache) directory. The `plugins` subcommands log to
//! stderr instead.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

/// Overrides the log directory.
pub const LOG_DIR_ENV: &str = "KILN_LOG_DIR";

fn filter(verbose: bool) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("kiln=trace,kiln_editor=trace,kiln_plugin=debug,info")
		} else {
			EnvFilter::new("kiln=debug,kiln_editor=debug,warn")
		}
	})
}

/// Directory the editor writes its log file into.
pub fn log_dir() -> Option<PathBuf> {
	if let Some(dir) = std::env::var_os(LOG_DIR_ENV) {
		return Some(PathBuf::from(dir));
	}
	dirs::state_dir().or_else(dirs::cache_dir).map(|dir| dir.join("kiln"))
}

fn open_log(dir: &Path) -> Option<(PathBuf, File)> {
	fs::create_dir_all(dir).ok()?;
	let path = dir.join(format!("kiln.{}.log", std::process::id()));
	let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
	Some((path, file))
}

/// Installs the global subscriber. With `to_stderr` the log goes to stderr;
/// otherwise to a file, or nowhere if no file can be opened.
pub fn setup_tracing(verbose: bool, to_stderr: bool) {
	if to_stderr {
		tracing_subscriber::fmt()
			.with_env_filter(filter(verbose))
			.with_writer(std::io::stderr)
			.init();
		return;
	}

	let Some((path, file)) = log_dir().as_deref().and_then(open_log) else {
		return;
	};

	let file_layer = tracing_subscriber::fmt::layer()
		.with_writer(file)
		.with_ansi(false)
		.with_span_events(FmtSpan::CLOSE)
		.with_target(true);

	tracing_subscriber::registry().with(filter(verbose)).with(file_layer).init();

	tracing::info!(path = ?path, version = kiln_editor::VERSION, "tracing initialized");
}

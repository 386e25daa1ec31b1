//! Plugin discovery.
//!
//! Search directories are scanned for entries named `kiln-plugin-*`. Each
//! match becomes the command line used to start it:
//!
//! * executable file: `[path]`
//! * single `*.rs` file: `source_runner + [file]`
//! * directory holding a `Cargo.toml`: `cargo run --quiet --manifest-path <dir>/Cargo.toml`
//! * directory of `*.rs` files: `source_runner + files`, sorted

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::api::PLUGIN_PREFIX;

/// Extra plugin directories, in the platform path-list format.
pub const PLUGINS_PATH_ENV: &str = "KILN_PLUGINS_PATH";
/// Module roots whose `bin/` directories are searched.
pub const MODULE_PATH_ENV: &str = "KILN_MODULE_PATH";

/// Where to look for plugins.
#[derive(Debug, Clone, Default)]
pub struct PluginSearch {
	/// Searched first. `None` means the current directory.
	pub local_dir: Option<PathBuf>,
	/// Roots whose `bin/` directory is searched.
	pub module_roots: Vec<PathBuf>,
	/// Value of [`MODULE_PATH_ENV`].
	pub module_path: Option<OsString>,
	/// Value of [`PLUGINS_PATH_ENV`].
	pub plugins_path: Option<OsString>,
}

impl PluginSearch {
	/// Configured directories plus whatever the environment adds.
	pub fn from_env(local_dir: Option<PathBuf>, module_roots: Vec<PathBuf>) -> Self {
		Self {
			local_dir,
			module_roots,
			module_path: std::env::var_os(MODULE_PATH_ENV),
			plugins_path: std::env::var_os(PLUGINS_PATH_ENV),
		}
	}
}

/// A search directory that could not be read.
#[derive(Debug, Error)]
#[error("failed to read plugin directory {}: {error}", path.display())]
pub struct DiscoveryError {
	pub path: PathBuf,
	#[source]
	pub error: io::Error,
}

/// Outcome of a scan: candidates found plus directories that failed.
#[derive(Debug, Default)]
pub struct Discovery {
	pub candidates: Vec<Vec<String>>,
	pub errors: Vec<DiscoveryError>,
}

/// Resolves the ordered, deduplicated list of existing search directories.
/// Invalid entries are logged and skipped.
pub fn search_paths(search: &PluginSearch) -> Vec<PathBuf> {
	let mut out: Vec<PathBuf> = Vec::new();
	let mut push = |source: &str, dir: PathBuf| match resolve_dir(&dir) {
		Ok(abs) => {
			if !out.contains(&abs) {
				out.push(abs);
			}
		}
		Err(e) => tracing::debug!(source, dir = %dir.display(), error = %e, "skipping plugin search path"),
	};

	push("local", search.local_dir.clone().unwrap_or_else(|| PathBuf::from(".")));

	let env_roots = search.module_path.iter().flat_map(std::env::split_paths);
	for root in search.module_roots.iter().cloned().chain(env_roots) {
		push(MODULE_PATH_ENV, root.join("bin"));
	}
	for dir in search.plugins_path.iter().flat_map(std::env::split_paths) {
		push(PLUGINS_PATH_ENV, dir);
	}

	tracing::debug!(paths = ?out, "plugin search paths");
	out
}

fn resolve_dir(dir: &Path) -> io::Result<PathBuf> {
	let abs = std::path::absolute(dir)?;
	if !fs::metadata(&abs)?.is_dir() {
		return Err(io::Error::new(io::ErrorKind::NotADirectory, "not a directory"));
	}
	Ok(abs)
}

/// Scans `dirs` for plugins. A directory that cannot be read is recorded and
/// the scan continues.
pub fn discover(dirs: &[PathBuf], source_runner: &[String]) -> Discovery {
	let mut discovery = Discovery::default();
	for dir in dirs {
		let entries = match fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(error) => {
				discovery.errors.push(DiscoveryError { path: dir.clone(), error });
				continue;
			}
		};
		let mut names: Vec<(String, PathBuf)> = entries
			.filter_map(|entry| entry.ok())
			.filter_map(|entry| {
				let name = entry.file_name().into_string().ok()?;
				name.starts_with(PLUGIN_PREFIX).then(|| (name, entry.path()))
			})
			.collect();
		names.sort();

		for (name, path) in names {
			if let Some(command) = candidate(&name, &path, source_runner) {
				tracing::trace!(command = ?command, "plugin candidate");
				discovery.candidates.push(command);
			}
		}
	}
	discovery
}

fn candidate(name: &str, path: &Path, source_runner: &[String]) -> Option<Vec<String>> {
	let meta = fs::metadata(path).ok()?;
	let display = path.to_string_lossy().into_owned();

	if meta.is_dir() {
		let manifest = path.join("Cargo.toml");
		if manifest.is_file() {
			let manifest = manifest.to_string_lossy().into_owned();
			return Some(["cargo", "run", "--quiet", "--manifest-path"].map(String::from).into_iter().chain([manifest]).collect());
		}
		let mut sources: Vec<String> = fs::read_dir(path)
			.ok()?
			.filter_map(|entry| entry.ok())
			.map(|entry| entry.path())
			.filter(|p| p.is_file() && has_rs_extension(p))
			.map(|p| p.to_string_lossy().into_owned())
			.collect();
		if sources.is_empty() {
			return None;
		}
		sources.sort();
		return Some(source_runner.iter().cloned().chain(sources).collect());
	}

	if has_rs_extension(Path::new(name)) {
		return Some(source_runner.iter().cloned().chain([display]).collect());
	}

	is_executable(name, &meta).then(|| vec![display])
}

fn has_rs_extension(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext == "rs")
}

#[cfg(unix)]
fn is_executable(_name: &str, meta: &fs::Metadata) -> bool {
	use std::os::unix::fs::PermissionsExt;
	meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(name: &str, meta: &fs::Metadata) -> bool {
	meta.is_file() && name.ends_with(".exe")
}

#[cfg(test)]
mod tests;

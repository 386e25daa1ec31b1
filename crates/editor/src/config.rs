//! `config.toml` loading.
//!
//! Every field has a default, so an absent file or an empty table is a valid
//! configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kiln_plugin::ChannelOptions;
use kiln_plugin::discovery::PluginSearch;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {}: {error}", path.display())]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or does not match the schema.
	#[error("failed to parse {}: {error}", path.display())]
	Parse {
		/// Path to the offending file.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub plugins: PluginsConfig,
	pub ui: UiConfig,
	pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginsConfig {
	pub enabled: bool,
	/// Searched before anything else. Defaults to the working directory.
	pub local_dir: Option<PathBuf>,
	/// Each root contributes `<root>/bin`.
	pub module_roots: Vec<PathBuf>,
	/// Command prefix used to run single-file and multi-file source plugins.
	pub source_runner: Vec<String>,
	pub handshake_timeout_ms: Option<u64>,
	pub quit_timeout_ms: u64,
}

impl Default for PluginsConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			local_dir: None,
			module_roots: Vec::new(),
			source_runner: vec!["rust-script".to_string()],
			handshake_timeout_ms: None,
			quit_timeout_ms: 1000,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
	/// Redraw signals arriving within this window coalesce into one draw.
	pub redraw_debounce_ms: u64,
}

impl Default for UiConfig {
	fn default() -> Self {
		Self { redraw_debounce_ms: 5 }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
	/// Backlog size of the deferred action queue at which a warning is logged.
	pub deferred_high_water: usize,
}

impl Default for EventsConfig {
	fn default() -> Self {
		Self {
			deferred_high_water: kiln_events::DEFAULT_HIGH_WATER,
		}
	}
}

impl Config {
	/// Loads `path`, or the default location when `None`.
	///
	/// A missing file yields the defaults; an explicitly named file must exist.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let (path, required) = match path {
			Some(path) => (path.to_path_buf(), true),
			None => match default_path() {
				Some(path) => (path, false),
				None => return Ok(Self::default()),
			},
		};

		let text = match std::fs::read_to_string(&path) {
			Ok(text) => text,
			Err(error) if !required && error.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "no config file, using defaults");
				return Ok(Self::default());
			}
			Err(error) => return Err(ConfigError::Io { path, error }),
		};

		Self::parse(&text).map_err(|error| ConfigError::Parse { path, error })
	}

	pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	pub fn channel_options(&self) -> ChannelOptions {
		ChannelOptions {
			handshake_timeout: self.plugins.handshake_timeout_ms.map(Duration::from_millis),
			quit_timeout: Duration::from_millis(self.plugins.quit_timeout_ms),
		}
	}

	/// Search directories from config, completed by the environment.
	pub fn plugin_search(&self) -> PluginSearch {
		PluginSearch::from_env(self.plugins.local_dir.clone(), self.plugins.module_roots.clone())
	}

	pub fn redraw_debounce(&self) -> Duration {
		Duration::from_millis(self.ui.redraw_debounce_ms)
	}
}

/// `<config dir>/kiln/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("kiln").join("config.toml"))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_text_is_default() {
		assert_eq!(Config::parse("").unwrap(), Config::default());
	}

	#[test]
	fn partial_tables_keep_other_defaults() {
		let config = Config::parse(
			r#"
			[plugins]
			enabled = false
			handshake_timeout_ms = 250

			[ui]
			redraw_debounce_ms = 16
			"#,
		)
		.unwrap();

		assert!(!config.plugins.enabled);
		assert_eq!(config.plugins.source_runner, vec!["rust-script".to_string()]);
		assert_eq!(config.ui.redraw_debounce_ms, 16);
		assert_eq!(config.events, EventsConfig::default());

		let options = config.channel_options();
		assert_eq!(options.handshake_timeout, Some(Duration::from_millis(250)));
		assert_eq!(options.quit_timeout, Duration::from_secs(1));
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(Config::parse("[ui]\nframe_rate = 60\n").is_err());
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}

	#[test]
	fn parse_error_names_the_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[plugins\n").unwrap();

		let err = Config::load(Some(&path)).unwrap_err();
		assert!(err.to_string().contains("config.toml"), "{err}");
	}

	#[test]
	fn loads_file_from_disk() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[events]\ndeferred_high_water = 8\n").unwrap();

		let config = Config::load(Some(&path)).unwrap();
		assert_eq!(config.events.deferred_high_water, 8);
	}
}

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use kiln_editor::{Config, ControlLoop};
use kiln_events::EventBus;
use kiln_plugin::discovery::{self, Discovery};
use kiln_plugin::{EditorSnapshot, HostBridge, PluginManager};

use crate::backend::CrosstermTerminal;
use crate::cli::{Cli, PluginsAction};

const CHECK_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Scans the configured search paths. Unreadable directories are logged.
fn discover_plugins(config: &Config) -> Vec<Vec<String>> {
	let dirs = discovery::search_paths(&config.plugin_search());
	let Discovery { candidates, errors } = discovery::discover(&dirs, &config.plugins.source_runner);
	for error in errors {
		tracing::warn!(%error, "plugin discovery");
	}
	candidates
}

/// Runs the interactive editor until it quits.
pub async fn run_editor(cli: Cli) -> anyhow::Result<ExitCode> {
	let config = Config::load(cli.config.as_deref())?;
	let terminal = CrosstermTerminal::new().context("failed to set up the terminal")?;
	let mut lp = ControlLoop::new(terminal, &config)?;

	lp.sender().post_items(cli.startup_commands());

	if config.plugins.enabled && !cli.no_plugins {
		let candidates = discover_plugins(&config);
		if let Some(error) = lp.load_plugins(candidates, config.channel_options()).await {
			lp.sender().post("alert", [error.to_string()]);
		}
	} else {
		tracing::info!("plugins disabled");
	}

	lp.run().await?;
	Ok(ExitCode::SUCCESS)
}

/// `kiln plugins <action>`: works without a terminal.
pub async fn run_plugins(cli: &Cli, action: PluginsAction) -> anyhow::Result<ExitCode> {
	let config = Config::load(cli.config.as_deref())?;
	let candidates = discover_plugins(&config);

	match action {
		PluginsAction::List => {
			for command in &candidates {
				println!("{}", command.join(" "));
			}
			Ok(ExitCode::SUCCESS)
		}
		PluginsAction::Check => {
			let (bus, _deferred) = EventBus::new(config.events.deferred_high_water);
			let snapshot = EditorSnapshot {
				editor_version: kiln_editor::VERSION.to_string(),
				..EditorSnapshot::default()
			};
			let mut options = config.channel_options();
			// A hung plugin fails the check instead of blocking it.
			options.handshake_timeout.get_or_insert(CHECK_HANDSHAKE_TIMEOUT);
			let mut manager = PluginManager::new(HostBridge::new(bus, snapshot), options);
			let error = manager.load(candidates).await;

			for details in manager.details() {
				println!("ok     {}: {}", details.name, details.description);
			}
			if let Some(error) = &error {
				for failure in &error.failures {
					println!("failed {failure}");
				}
			}
			if let Err(error) = manager.unload_all().await {
				eprintln!("{error}");
			}

			Ok(if error.is_some() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
		}
	}
}

//! kiln: terminal editor front end.

mod app;
mod backend;
mod cli;
mod logging;
#[cfg(test)]
mod tests;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();

	match &cli.command {
		Some(Command::Plugins { action }) => {
			logging::setup_tracing(cli.verbose, true);
			app::run_plugins(&cli, *action).await
		}
		None => {
			logging::setup_tracing(cli.verbose, false);
			let result = app::run_editor(cli).await;
			if let Err(error) = &result {
				tracing::error!(error = %format!("{error:#}"), "editor exited with an error");
			}
			result
		}
	}
}

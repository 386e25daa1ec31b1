use std::collections::HashMap;

use kiln_worker::{TaskClass, WorkerJoinSet};
use tokio::task::Id;

use crate::api::PluginDetails;
use crate::{ChannelOptions, HostBridge, LoadFailure, PluginChannel, PluginError, PluginLoadError, UnloadError};

type LoadOutcome = (Vec<String>, crate::Result<PluginChannel>);

/// Spawns every candidate concurrently and waits for all of them.
///
/// Partial failure is not fatal: the live channels are returned together
/// with one combined error describing every candidate that failed.
pub async fn load_all(
	candidates: Vec<Vec<String>>,
	options: &ChannelOptions,
	host: &HostBridge,
) -> (Vec<PluginChannel>, Option<PluginLoadError>) {
	let mut set = WorkerJoinSet::new(TaskClass::Background, "plugin.load");
	let mut commands = HashMap::with_capacity(candidates.len());
	for command in candidates {
		let options = options.clone();
		let host = host.clone();
		let owned = command.clone();
		let id = set.spawn(async move {
			let result = PluginChannel::spawn(owned.clone(), &options, &host).await;
			(owned, result)
		});
		commands.insert(id, command);
	}

	let (live, failures) = join_loads(set, commands).await;
	tracing::info!(loaded = live.len(), failed = failures.len(), "plugins loaded");

	let error = (!failures.is_empty()).then_some(PluginLoadError { failures });
	(live, error)
}

/// Splits finished loads into live channels and failures. A load task that
/// panicked is reported against the command it was spawned for.
async fn join_loads(
	set: WorkerJoinSet<LoadOutcome>,
	mut commands: HashMap<Id, Vec<String>>,
) -> (Vec<PluginChannel>, Vec<LoadFailure>) {
	let mut live = Vec::new();
	let mut failures = Vec::new();
	for joined in set.join_all().await {
		let (command, error) = match joined {
			Ok((_, Ok(channel))) => {
				live.push(channel);
				continue;
			}
			Ok((command, Err(error))) => (command, error),
			Err(join) => (commands.remove(&join.id()).unwrap_or_default(), PluginError::LoadTask(join)),
		};
		tracing::warn!(command = ?command, error = %error, "plugin failed to load");
		failures.push(LoadFailure { command, error });
	}
	(live, failures)
}

/// Owns every live plugin channel.
pub struct PluginManager {
	host: HostBridge,
	options: ChannelOptions,
	plugins: Vec<PluginChannel>,
}

impl PluginManager {
	pub fn new(host: HostBridge, options: ChannelOptions) -> Self {
		Self {
			host,
			options,
			plugins: Vec::new(),
		}
	}

	pub fn host(&self) -> &HostBridge {
		&self.host
	}

	/// Loads `candidates`, keeping every plugin that came up.
	pub async fn load(&mut self, candidates: Vec<Vec<String>>) -> Option<PluginLoadError> {
		let (live, error) = load_all(candidates, &self.options, &self.host).await;
		self.plugins.extend(live);
		error
	}

	/// Closes every plugin. A failure to close one does not stop the others.
	pub async fn unload_all(&mut self) -> Result<(), UnloadError> {
		let mut failures = Vec::new();
		for mut plugin in self.plugins.drain(..) {
			if let Err(e) = plugin.close().await {
				failures.push((plugin.name().to_owned(), e));
			}
		}
		if failures.is_empty() { Ok(()) } else { Err(UnloadError { failures }) }
	}

	pub fn plugins(&self) -> &[PluginChannel] {
		&self.plugins
	}

	pub fn details(&self) -> Vec<PluginDetails> {
		self.plugins.iter().map(|p| p.details().clone()).collect()
	}

	pub fn len(&self) -> usize {
		self.plugins.len()
	}

	pub fn is_empty(&self) -> bool {
		self.plugins.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn panicked_load_becomes_a_failure() {
		let mut set: WorkerJoinSet<LoadOutcome> = WorkerJoinSet::new(TaskClass::Background, "test");
		let mut commands = HashMap::new();
		let id = set.spawn(async {
			if 1 + 1 == 2 {
				panic!("plugin constructor blew up");
			}
			(Vec::new(), Err(PluginError::EmptyCommand))
		});
		commands.insert(id, vec!["kiln-plugin-a".to_string()]);
		let id = set.spawn(async { (vec!["kiln-plugin-b".to_string()], Err(PluginError::HandshakeEof)) });
		commands.insert(id, vec!["kiln-plugin-b".to_string()]);

		let (live, mut failures) = join_loads(set, commands).await;
		assert!(live.is_empty());
		assert_eq!(failures.len(), 2);
		failures.sort_by(|a, b| a.command.cmp(&b.command));
		assert_eq!(failures[0].command, ["kiln-plugin-a"]);
		assert!(matches!(&failures[0].error, PluginError::LoadTask(e) if e.is_panic()));
		assert!(failures[0].to_string().starts_with("failed to load [kiln-plugin-a]: load task failed"));
		assert_eq!(failures[1].command, ["kiln-plugin-b"]);
		assert!(matches!(failures[1].error, PluginError::HandshakeEof));
	}
}

//! End-to-end plugin loading against the sample plugin binary.

#![cfg(unix)]

use std::time::Duration;

use kiln_events::{DEFAULT_HIGH_WATER, EventBus, EventKind};
use kiln_plugin::{ChannelOptions, ChannelState, EditorSnapshot, HostBridge, PluginManager, load_all};

const SAMPLE: &str = env!("CARGO_BIN_EXE_kiln-plugin-sample");

fn host() -> (HostBridge, kiln_events::DeferredQueue) {
	let (bus, queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let snapshot = EditorSnapshot {
		editor_id: "test-editor".into(),
		editor_version: "0.0.0".into(),
		..EditorSnapshot::default()
	};
	(HostBridge::new(bus, snapshot), queue)
}

fn options() -> ChannelOptions {
	ChannelOptions {
		handshake_timeout: Some(Duration::from_secs(20)),
		quit_timeout: Duration::from_secs(2),
	}
}

fn sh(script: &str) -> Vec<String> {
	vec!["sh".into(), "-c".into(), script.into()]
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
	for _ in 0..200 {
		if check() {
			return true;
		}
		tokio::time::sleep(Duration::from_millis(25)).await;
	}
	check()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn partial_failure_keeps_live_plugins_and_reports_the_rest() {
	let (host, _queue) = host();
	let candidates = vec![
		vec![SAMPLE.to_owned()],
		sh("printf 0000000000000000; sleep 5"),
		vec![SAMPLE.to_owned()],
		sh("echo boom >&2; sleep 5"),
		vec![SAMPLE.to_owned()],
	];

	let (mut live, error) = load_all(candidates, &options(), &host).await;
	assert_eq!(live.len(), 3);
	let error = error.expect("two candidates must fail");
	assert_eq!(error.failures.len(), 2);
	let text = error.to_string();
	assert_eq!(text.lines().count(), 2);
	assert!(text.lines().all(|line| line.starts_with("failed to load [")));
	assert!(text.contains("unexpected protocol version"), "{text}");
	assert!(text.contains("boom"), "{text}");

	for plugin in &live {
		assert_eq!(plugin.name(), "sample");
		assert_eq!(plugin.state(), ChannelState::Live);
		assert!(plugin.pid().is_some());
	}
	assert!(eventually(|| live.iter().all(|p| p.is_initialized())).await);

	for plugin in &mut live {
		plugin.close().await.unwrap();
		assert_eq!(plugin.state(), ChannelState::Closed);
		plugin.close().await.unwrap();
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn plugin_subscriptions_are_released_on_unload() {
	let (host, _queue) = host();
	let mut manager = PluginManager::new(host.clone(), options());
	assert!(manager.load(vec![vec![SAMPLE.to_owned()], vec![SAMPLE.to_owned()]]).await.is_none());
	assert_eq!(manager.len(), 2);
	assert!(manager.details().iter().all(|d| d.name == "sample"));

	let bus = host.bus().clone();
	assert!(eventually(|| bus.subscriber_count(EventKind::EditorKeyboardModeChanged) == 2).await);

	manager.unload_all().await.unwrap();
	assert!(manager.is_empty());
	assert_eq!(bus.subscriber_count(EventKind::EditorKeyboardModeChanged), 0);
}

#[tokio::test]
async fn missing_program_is_a_load_failure() {
	let (host, _queue) = host();
	let (live, error) = load_all(vec![vec!["/nonexistent/kiln-plugin-x".into()], vec![]], &options(), &host).await;
	assert!(live.is_empty());
	assert_eq!(error.map(|e| e.failures.len()), Some(2));
}

#[test]
fn sample_refuses_to_run_outside_the_host() {
	let output = std::process::Command::new(SAMPLE).env_remove("KILN").output().unwrap();
	assert!(!output.status.success());
	assert!(output.stdout.is_empty());
	assert!(String::from_utf8_lossy(&output.stderr).contains("only meant to be started by kiln"));
}

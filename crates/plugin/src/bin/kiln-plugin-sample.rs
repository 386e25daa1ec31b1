//! Minimal kiln plugin. Exercises the plugin runtime end to end and doubles
//! as a skeleton for new plugins.

use std::process::ExitCode;

use kiln_events::{EventKind, EventPayload};
use kiln_plugin::api::PluginDetails;
use kiln_plugin::guest::{self, EditorProxy, Plugin};
use kiln_worker::TaskClass;

struct Sample;

impl Plugin for Sample {
	fn details(&self) -> PluginDetails {
		PluginDetails {
			name: "sample".into(),
			description: "Logs keyboard mode changes".into(),
		}
	}

	fn init(&self, editor: &EditorProxy) {
		let editor = editor.clone();
		kiln_worker::spawn(TaskClass::Background, "sample.subscribe", async move {
			if let Err(e) = editor.subscribe(EventKind::EditorKeyboardModeChanged).await {
				eprintln!("sample: subscribe failed: {e}");
			}
		});
	}

	fn on_event(&self, _id: kiln_events::EventId, event: &EventPayload) {
		if let EventPayload::EditorKeyboardModeChanged(changed) = event {
			eprintln!("sample: keyboard mode is now {}", changed.mode);
		}
	}
}

fn main() -> ExitCode {
	guest::main(Sample)
}

use std::collections::BTreeMap;

use kiln_primitives::ViewId;

use super::View;

/// Builds a fresh view for a new window.
pub type ViewFactory = fn(ViewId) -> View;

/// Named view constructors usable with `window_new`.
#[derive(Clone)]
pub struct ViewFactories {
	factories: BTreeMap<String, ViewFactory>,
}

impl ViewFactories {
	pub fn empty() -> Self {
		Self {
			factories: BTreeMap::new(),
		}
	}

	/// Returns true if `name` was not registered before.
	pub fn register(&mut self, name: impl Into<String>, factory: ViewFactory) -> bool {
		self.factories.insert(name.into(), factory).is_none()
	}

	pub fn get(&self, name: &str) -> Option<ViewFactory> {
		self.factories.get(name).copied()
	}

	/// Sorted factory names.
	pub fn names(&self) -> Vec<String> {
		self.factories.keys().cloned().collect()
	}
}

impl Default for ViewFactories {
	fn default() -> Self {
		let mut factories = Self::empty();
		factories.register("command", |id| View::new(id, "command", "Command"));
		factories.register("document", |id| View::new(id, "document", "New document"));
		factories.register("infobar_alert", |id| View::new(id, "infobar_alert", "Alert").disabled());
		factories.register("status_root", |id| View::new(id, "status_root", "Status").disabled());
		factories.register("status_name", |id| View::new(id, "status_name", "Name").disabled());
		factories.register("status_position", |id| View::new(id, "status_position", "Position").disabled());
		factories
	}
}

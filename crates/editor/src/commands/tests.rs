use kiln_primitives::{Size, ViewId};

use super::*;
use crate::keymap::KeyBindings;
use crate::window::{Docking, View};

fn noop(_: &mut CommandContext<'_>, _: &[String]) -> Result<(), CommandError> {
	Ok(())
}

fn def(name: &'static str) -> Arc<dyn Command> {
	Arc::new(CommandDef {
		name,
		expected_args: None,
		category: CommandCategory::Plugin,
		short_desc: "",
		long_desc: "",
		handler: noop,
	})
}

#[test]
fn register_reports_replacement() {
	let mut commands = Commands::default();
	assert!(commands.register(def("a")));
	assert!(commands.register(def("b")));
	assert!(!commands.register(def("a")));
	assert_eq!(commands.names(), ["a", "b"]);
	assert!(commands.unregister("a").is_some());
	assert_eq!(commands.len(), 1);
}

#[test]
fn lookup_prefers_nearest_scope() {
	let mut tree = WindowTree::new(Size::new(10, 10), |id| {
		let mut view = View::new(id, "root", "root");
		view.commands.register(def("shared"));
		view.commands.register(def("root_only"));
		view
	});
	let child = tree
		.attach(WindowId::ROOT, Docking::Fill, true, |id: ViewId| {
			let mut view = View::new(id, "document", "doc");
			view.commands.register(Arc::new(CommandAlias::new("shared", "root_only")));
			view
		})
		.unwrap();

	let found = lookup(&tree, child, "shared").unwrap();
	assert_eq!(found.category(), CommandCategory::Alias);
	assert_eq!(lookup(&tree, WindowId::ROOT, "shared").unwrap().category(), CommandCategory::Plugin);
	assert!(lookup(&tree, child, "root_only").is_some());
	assert!(lookup(&tree, child, "missing").is_none());
	assert!(lookup(&tree, WindowId(99), "shared").is_none());
}

#[test]
fn builtins_install_with_aliases_and_keys() {
	let mut commands = Commands::default();
	let mut keys = KeyBindings::default();
	install_builtins(&mut commands, &mut keys);

	assert_eq!(commands.len(), BUILTINS.len() + ALIASES.len());
	for (alias, _) in ALIASES {
		assert_eq!(commands.get(alias).unwrap().category(), CommandCategory::Alias);
	}
	assert!(commands.get("alert").is_some());
	assert!(!keys.is_empty());
}

use clap::CommandFactory;

use super::*;

fn target(s: &str) -> OpenTarget {
	s.parse().unwrap()
}

#[test]
fn plain_path() {
	assert_eq!(
		target("foo/bar.txt"),
		OpenTarget {
			path: "foo/bar.txt".into(),
			line: None,
			column: None
		}
	);
}

#[test]
fn line_and_column_are_zero_based() {
	let t = target("foo/bar.txt:42:10");
	assert_eq!(t.path, "foo/bar.txt");
	assert_eq!(t.line, Some(41));
	assert_eq!(t.column, Some(9));

	assert_eq!(target("file.txt:1").line, Some(0));
}

#[test]
fn invalid_suffixes_stay_in_the_path() {
	for s in ["file.txt:0", "file.txt:abc", "file.txt:", "file.txt:3:abc", ":5"] {
		let t = target(s);
		assert_eq!(t.path, s);
		assert_eq!(t.line, None, "{s}");
	}
}

#[test]
fn non_numeric_middle_part_belongs_to_the_path() {
	let t = target("odd:name:7");
	assert_eq!(t.path, "odd:name");
	assert_eq!(t.line, Some(6));
	assert_eq!(t.column, None);
}

#[test]
fn drive_letter_is_not_a_suffix() {
	let t = target("C:\\Users\\test\\file.txt:42");
	assert_eq!(t.path, "C:\\Users\\test\\file.txt");
	assert_eq!(t.line, Some(41));
}

#[test]
fn startup_without_file_opens_empty_document() {
	let cli = Cli::try_parse_from(["kiln"]).unwrap();
	let names: Vec<_> = cli.startup_commands().into_iter().map(|i| i.name).collect();
	assert_eq!(names, ["bootstrap_ui", "document_new"]);
}

#[test]
fn startup_with_position_moves_cursor() {
	let cli = Cli::try_parse_from(["kiln", "notes.md:3:4"]).unwrap();
	let items = cli.startup_commands();
	assert_eq!(items[1], CommandItem::new("document_open", ["notes.md"]));
	assert_eq!(items[2], CommandItem::new("document_cursor_move", ["2", "3"]));
}

#[test]
fn plugin_subcommands_parse() {
	let cli = Cli::try_parse_from(["kiln", "plugins", "check", "--config", "/tmp/k.toml"]).unwrap();
	assert!(matches!(
		cli.command,
		Some(Command::Plugins {
			action: PluginsAction::Check
		})
	));
	assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));
}

#[test]
fn schema_is_consistent() {
	Cli::command().debug_assert();
}

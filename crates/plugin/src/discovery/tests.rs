use std::fs;

use pretty_assertions::assert_eq;

use super::*;

fn runner() -> Vec<String> {
	vec!["rust-script".into()]
}

fn s(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}

#[test]
fn classifies_every_shape_and_skips_the_rest() {
	let tmp = tempfile::tempdir().unwrap();
	let root = tmp.path();

	fs::write(root.join("kiln-plugin-single.rs"), "fn main() {}").unwrap();
	fs::create_dir(root.join("kiln-plugin-crate")).unwrap();
	fs::write(root.join("kiln-plugin-crate/Cargo.toml"), "[package]").unwrap();
	fs::create_dir(root.join("kiln-plugin-multi")).unwrap();
	fs::write(root.join("kiln-plugin-multi/b.rs"), "").unwrap();
	fs::write(root.join("kiln-plugin-multi/a.rs"), "").unwrap();
	fs::write(root.join("kiln-plugin-multi/notes.txt"), "").unwrap();
	fs::create_dir(root.join("kiln-plugin-empty")).unwrap();
	fs::write(root.join("unrelated.rs"), "").unwrap();
	fs::write(root.join("kiln-plugin-data.txt"), "").unwrap();

	let found = discover(&[root.to_path_buf()], &runner());
	assert!(found.errors.is_empty());
	assert_eq!(
		found.candidates,
		vec![
			vec![
				"cargo".into(),
				"run".into(),
				"--quiet".into(),
				"--manifest-path".into(),
				s(&root.join("kiln-plugin-crate/Cargo.toml")),
			],
			vec!["rust-script".into(), s(&root.join("kiln-plugin-multi/a.rs")), s(&root.join("kiln-plugin-multi/b.rs"))],
			vec!["rust-script".into(), s(&root.join("kiln-plugin-single.rs"))],
		]
	);
}

#[cfg(unix)]
#[test]
fn executables_need_the_exec_bit() {
	use std::os::unix::fs::PermissionsExt;

	let tmp = tempfile::tempdir().unwrap();
	let exec = tmp.path().join("kiln-plugin-bin");
	let plain = tmp.path().join("kiln-plugin-plain");
	fs::write(&exec, "#!/bin/sh\n").unwrap();
	fs::write(&plain, "").unwrap();
	fs::set_permissions(&exec, fs::Permissions::from_mode(0o755)).unwrap();
	fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).unwrap();

	let found = discover(&[tmp.path().to_path_buf()], &runner());
	assert_eq!(found.candidates, vec![vec![s(&exec)]]);
}

#[test]
fn unreadable_directory_is_recorded_and_scan_continues() {
	let tmp = tempfile::tempdir().unwrap();
	fs::write(tmp.path().join("kiln-plugin-x.rs"), "").unwrap();
	let missing = tmp.path().join("missing");

	let found = discover(&[missing.clone(), tmp.path().to_path_buf()], &runner());
	assert_eq!(found.errors.len(), 1);
	assert_eq!(found.errors[0].path, missing);
	assert_eq!(found.candidates.len(), 1);
}

#[test]
fn search_paths_join_config_and_env_and_skip_invalid() {
	let tmp = tempfile::tempdir().unwrap();
	let local = tmp.path().join("local");
	let module = tmp.path().join("module");
	let env_module = tmp.path().join("env_module");
	let extra = tmp.path().join("extra");
	for dir in [&local, &module.join("bin"), &env_module.join("bin"), &extra] {
		fs::create_dir_all(dir).unwrap();
	}
	let file = tmp.path().join("file");
	fs::write(&file, "").unwrap();

	let search = PluginSearch {
		local_dir: Some(local.clone()),
		module_roots: vec![module.clone(), tmp.path().join("nope")],
		module_path: Some(std::env::join_paths([&env_module]).unwrap()),
		plugins_path: Some(std::env::join_paths([&extra, &file, &local]).unwrap()),
	};
	assert_eq!(search_paths(&search), vec![local, module.join("bin"), env_module.join("bin"), extra]);
}

//! Frame composition.
//!
//! The frame is plain text: the window tree, one row per window, then a
//! status row. Backends decide how to paint it.

use kiln_primitives::{KeyboardMode, Size, WindowId};

use crate::Editor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
	pub size: Size,
	pub lines: Vec<String>,
	/// Bottom row: command line, latest alert, or the mode.
	pub status: String,
}

pub fn compose(editor: &Editor) -> Frame {
	let tree = editor.tree();
	let size = tree.size();
	let active = editor.active_window();
	let body_rows = usize::from(size.rows.saturating_sub(1));

	let mut lines = Vec::new();
	for id in tree.depth_first(WindowId::ROOT) {
		let Some(window) = tree.get(id) else { continue };
		let depth = tree.ancestors(id).count().saturating_sub(1);
		let marker = if id == active { '*' } else { ' ' };
		let mut line = format!("{marker}{:indent$}{} [{}]", "", window.view.title, window.docking, indent = depth * 2);
		if let Some(document) = window.view.document.and_then(|d| editor.document(d)) {
			line.push_str(&format!(" {}:{}", document.line + 1, document.column + 1));
			if document.modified {
				line.push_str(" +");
			}
		}
		lines.push(clip(line, size.cols));
	}
	lines.truncate(body_rows);

	let status = match editor.keyboard_mode() {
		KeyboardMode::Command => format!(":{}", editor.command_line()),
		mode => match editor.alerts().last() {
			Some(alert) => alert.clone(),
			None => format!("-- {mode} --"),
		},
	};

	Frame {
		size,
		lines,
		status: clip(status, size.cols),
	}
}

fn clip(mut line: String, cols: u16) -> String {
	if let Some((at, _)) = line.char_indices().nth(usize::from(cols)) {
		line.truncate(at);
	}
	line
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clip_respects_char_boundaries() {
		assert_eq!(clip("héllo".to_string(), 2), "hé");
		assert_eq!(clip("ab".to_string(), 10), "ab");
	}

	#[test]
	fn marks_active_window_and_mode() {
		let (mut editor, _channels) = Editor::new(Size::new(40, 10), 16);
		editor.new_document(WindowId::ROOT, Some("notes.txt".into())).unwrap();

		let frame = compose(&editor);
		assert_eq!(frame.lines[0], " kiln [fill]");
		assert_eq!(frame.lines[1], "*  notes.txt [fill] 1:1");
		assert_eq!(frame.status, "-- edit --");
	}
}

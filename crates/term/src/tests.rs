use crossterm::event::{Event, KeyCode as Ct, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use kiln_editor::TerminalEvent;
use kiln_primitives::{KeyCode, KeyPress, Modifiers, Size};

use crate::backend::{map_event, map_key};

fn key(code: Ct, modifiers: KeyModifiers) -> KeyEvent {
	KeyEvent::new(code, modifiers)
}

#[test]
fn printable_keys_map_to_chars() {
	assert_eq!(map_key(key(Ct::Char('a'), KeyModifiers::NONE)), Some(KeyPress::char('a')));
	let upper = map_key(key(Ct::Char('A'), KeyModifiers::SHIFT)).unwrap();
	assert_eq!(upper, KeyPress::char('A'));
	assert_eq!(upper.name(), "A");
}

#[test]
fn control_chords_keep_their_binding_names() {
	let ctrl_q = map_key(key(Ct::Char('q'), KeyModifiers::CONTROL)).unwrap();
	assert_eq!(ctrl_q.modifiers, Modifiers::CTRL);
	assert_eq!(ctrl_q.name(), "Ctrl-Q");

	let shift_tab = map_key(key(Ct::Tab, KeyModifiers::SHIFT)).unwrap();
	assert_eq!(shift_tab.name(), "Shift-Tab");
	assert_eq!(map_key(key(Ct::BackTab, KeyModifiers::SHIFT)), Some(shift_tab));
}

#[test]
fn named_keys() {
	assert_eq!(map_key(key(Ct::Enter, KeyModifiers::NONE)), Some(KeyPress::new(KeyCode::Enter)));
	assert_eq!(map_key(key(Ct::Esc, KeyModifiers::NONE)), Some(KeyPress::new(KeyCode::Esc)));
	assert_eq!(map_key(key(Ct::F(5), KeyModifiers::NONE)).map(|k| k.name()), Some("F5".to_string()));
	assert_eq!(map_key(key(Ct::Insert, KeyModifiers::NONE)), None);
}

#[test]
fn releases_are_ignored() {
	let release = KeyEvent::new_with_kind_and_state(Ct::Char('x'), KeyModifiers::NONE, KeyEventKind::Release, KeyEventState::NONE);
	assert_eq!(map_key(release), None);
}

#[test]
fn resize_events_carry_the_new_size() {
	assert_eq!(map_event(Event::Resize(100, 30)), Some(TerminalEvent::Resize(Size::new(100, 30))));
	assert_eq!(map_event(Event::FocusGained), None);
}

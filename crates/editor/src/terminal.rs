//! Terminal seam between the control loop and a concrete backend.

use std::io;

use kiln_primitives::{KeyPress, Size};
use tokio::sync::mpsc;

use crate::render::Frame;

/// Input produced by a terminal backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
	Key(KeyPress),
	Resize(Size),
}

pub trait Terminal {
	fn size(&self) -> Size;

	/// Hands out the input stream. Returns `None` once taken.
	fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TerminalEvent>>;

	fn draw(&mut self, frame: &Frame) -> io::Result<()>;
}

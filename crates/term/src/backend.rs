//! Crossterm terminal backend.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute, queue};
use kiln_editor::render::Frame;
use kiln_editor::{Terminal, TerminalEvent};
use kiln_primitives::{KeyCode, KeyPress, Modifiers, Size};
use kiln_worker::TaskClass;
use tokio::sync::mpsc;

/// How long the input thread blocks before checking whether the loop is gone.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Raw-mode, alternate-screen terminal on stdout.
///
/// Input is read on a dedicated thread and forwarded through a channel. The
/// terminal is restored when this value is dropped.
pub struct CrosstermTerminal {
	out: Stdout,
	size: Size,
	events: Option<mpsc::UnboundedReceiver<TerminalEvent>>,
}

impl CrosstermTerminal {
	pub fn new() -> io::Result<Self> {
		let (width, height) = terminal::size()?;
		terminal::enable_raw_mode()?;
		let mut out = io::stdout();
		if let Err(e) = execute!(out, terminal::EnterAlternateScreen, cursor::Hide, terminal::Clear(ClearType::All)) {
			let _ = terminal::disable_raw_mode();
			return Err(e);
		}

		let (tx, rx) = mpsc::unbounded_channel();
		kiln_worker::spawn_named_thread(TaskClass::IoBlocking, "kiln.input", move || read_input(tx))?;

		Ok(Self {
			out,
			size: Size::new(width, height),
			events: Some(rx),
		})
	}
}

impl Drop for CrosstermTerminal {
	fn drop(&mut self) {
		let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
		let _ = terminal::disable_raw_mode();
	}
}

impl Terminal for CrosstermTerminal {
	fn size(&self) -> Size {
		self.size
	}

	fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TerminalEvent>> {
		self.events.take()
	}

	fn draw(&mut self, frame: &Frame) -> io::Result<()> {
		self.size = frame.size;
		let rows = frame.size.rows;
		for (row, line) in (0..rows.saturating_sub(1)).zip(frame.lines.iter().map(String::as_str).chain(std::iter::repeat(""))) {
			queue!(self.out, cursor::MoveTo(0, row), terminal::Clear(ClearType::CurrentLine))?;
			self.out.write_all(line.as_bytes())?;
		}
		if rows > 0 {
			queue!(self.out, cursor::MoveTo(0, rows - 1), terminal::Clear(ClearType::CurrentLine))?;
			self.out.write_all(frame.status.as_bytes())?;
		}
		self.out.flush()
	}
}

/// Forwards terminal events until the receiving side closes or reading fails.
fn read_input(tx: mpsc::UnboundedSender<TerminalEvent>) {
	while !tx.is_closed() {
		match event::poll(POLL_INTERVAL) {
			Ok(false) => continue,
			Ok(true) => {}
			Err(error) => {
				tracing::error!(%error, "terminal poll failed");
				break;
			}
		}
		let event = match event::read() {
			Ok(event) => event,
			Err(error) => {
				tracing::error!(%error, "terminal read failed");
				break;
			}
		};
		if let Some(event) = map_event(event)
			&& tx.send(event).is_err()
		{
			break;
		}
	}
	tracing::debug!("input thread stopped");
}

pub(crate) fn map_event(event: Event) -> Option<TerminalEvent> {
	match event {
		Event::Key(key) => map_key(key).map(TerminalEvent::Key),
		Event::Resize(width, height) => Some(TerminalEvent::Resize(Size::new(width, height))),
		_ => None,
	}
}

/// Only presses are forwarded; repeats and releases are dropped.
pub(crate) fn map_key(key: KeyEvent) -> Option<KeyPress> {
	if key.kind != KeyEventKind::Press {
		return None;
	}
	use crossterm::event::KeyCode as Ct;
	if key.code == Ct::BackTab {
		return Some(KeyPress::new(KeyCode::Tab).with_modifiers(Modifiers {
			shift: true,
			..Modifiers::NONE
		}));
	}
	let code = match key.code {
		Ct::Char(c) => KeyCode::Char(c),
		Ct::Enter => KeyCode::Enter,
		Ct::Esc => KeyCode::Esc,
		Ct::Backspace => KeyCode::Backspace,
		Ct::Tab => KeyCode::Tab,
		Ct::Delete => KeyCode::Delete,
		Ct::Up => KeyCode::Up,
		Ct::Down => KeyCode::Down,
		Ct::Left => KeyCode::Left,
		Ct::Right => KeyCode::Right,
		Ct::Home => KeyCode::Home,
		Ct::End => KeyCode::End,
		Ct::PageUp => KeyCode::PageUp,
		Ct::PageDown => KeyCode::PageDown,
		Ct::F(n) => KeyCode::F(n),
		_ => return None,
	};

	// Shift is already folded into the character for printable keys.
	let shift = key.modifiers.contains(KeyModifiers::SHIFT) && !matches!(code, KeyCode::Char(_));
	let modifiers = Modifiers {
		ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
		alt: key.modifiers.contains(KeyModifiers::ALT),
		shift,
	};
	Some(KeyPress::new(code).with_modifiers(modifiers))
}

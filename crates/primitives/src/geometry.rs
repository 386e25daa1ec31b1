use serde::{Deserialize, Serialize};

/// Terminal size expressed in text-grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
	pub cols: u16,
	pub rows: u16,
}

impl Size {
	pub const fn new(cols: u16, rows: u16) -> Self {
		Self { cols, rows }
	}
}

//! Value types shared by the event bus, the command queue and the plugin protocol.

/// Command batches submitted to the control loop.
pub mod command;
/// Terminal geometry.
pub mod geometry;
/// Identifier types for editor entities.
pub mod ids;
/// Key press types.
pub mod key;
/// Keyboard mode definitions.
pub mod mode;

pub use command::{CommandBatch, CommandItem};
pub use geometry::Size;
pub use ids::{DocumentId, ViewId, WindowId};
pub use key::{KeyCode, KeyPress, Modifiers};
pub use mode::KeyboardMode;

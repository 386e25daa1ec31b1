//! Editor state, command routing and the control loop.
//!
//! The [`ControlLoop`] is the single consumer that mutates the [`Editor`].
//! Everything else feeds it: command batches through a [`CommandSender`],
//! bus deliveries through the deferred queue, input through a [`Terminal`].

pub mod command_queue;
pub mod commands;
pub mod config;
mod editor;
mod error;
pub mod keymap;
pub mod render;
pub mod runtime;
pub mod terminal;
pub mod window;

pub use command_queue::{CommandReceiver, CommandSender};
pub use commands::{Command, CommandAlias, CommandCategory, CommandContext, CommandDef, CommandError, Commands};
pub use config::{Config, ConfigError};
pub use editor::{Document, Editor, EditorChannels, RedrawHandle, VERSION};
pub use error::{EditorError, Result};
pub use render::Frame;
pub use runtime::{ControlLoop, Step};
pub use terminal::{Terminal, TerminalEvent};

//! Task spawning for the kiln control plane.
//!
//! Every background task carries a [`TaskClass`] and a short name so that
//! traces can attribute work (`plugin.stderr`, `plugin.on_start`, ...).
//! The control loop itself never runs on these tasks; they only feed it
//! through channels.

mod class;
mod join_set;
mod spawn;

pub use class::TaskClass;
pub use join_set::WorkerJoinSet;
pub use spawn::{spawn, spawn_named_thread};

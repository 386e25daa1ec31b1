use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Fatal editor errors. Everything recoverable becomes an alert instead.
#[derive(Debug, Error)]
pub enum EditorError {
	/// The `alert` builtin must resolve from the root window, or failures
	/// would have nowhere to go.
	#[error("the \"alert\" command is not registered on the root window")]
	MissingAlert,

	#[error("terminal input stream was already taken")]
	InputTaken,

	#[error("terminal error: {0}")]
	Terminal(#[from] io::Error),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EditorError>;

/// Execution classes used for observability of spawned work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work whose latency the user notices (handshakes, start calls).
	Interactive,
	/// Long-lived stream pumps and waiters.
	Background,
	/// Blocking reads on dedicated threads (terminal input).
	IoBlocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::IoBlocking => "io_blocking",
		}
	}
}

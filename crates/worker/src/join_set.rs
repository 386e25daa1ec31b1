use std::future::Future;

use tokio::task::{Id, JoinError, JoinSet};

use crate::TaskClass;

/// Classified wrapper for a Tokio [`JoinSet`].
///
/// Used where a caller fans out a group of tasks and must join on every one
/// of them before continuing (concurrent plugin loads, concurrent closes).
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	name: &'static str,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	pub fn new(class: TaskClass, name: &'static str) -> Self {
		Self {
			class,
			name,
			inner: JoinSet::new(),
		}
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set on the current runtime. The returned id
	/// matches [`JoinError::id`] if the task fails.
	pub fn spawn<F>(&mut self, fut: F) -> Id
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(
			worker_class = self.class.as_str(),
			task = self.name,
			pending = self.inner.len(),
			"worker.join_set.spawn"
		);
		self.inner.spawn(fut).id()
	}

	/// Waits for the next completed task.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Waits for every task and returns the results in completion order.
	///
	/// Panicked or cancelled tasks are logged and reported as their
	/// [`JoinError`].
	pub async fn join_all(mut self) -> Vec<Result<T, JoinError>> {
		let mut out = Vec::with_capacity(self.inner.len());
		while let Some(res) = self.inner.join_next().await {
			if let Err(err) = &res {
				tracing::error!(task = self.name, error = %err, "worker task failed to join");
			}
			out.push(res);
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn join_all_waits_for_every_task() {
		let mut set = WorkerJoinSet::new(TaskClass::Interactive, "test");
		for i in 0..4u64 {
			set.spawn(async move {
				tokio::time::sleep(Duration::from_millis(10 * (4 - i))).await;
				i
			});
		}
		let mut out: Vec<u64> = set.join_all().await.into_iter().map(Result::unwrap).collect();
		out.sort_unstable();
		assert_eq!(out, vec![0, 1, 2, 3]);
	}

	#[tokio::test]
	async fn panicking_task_is_reported_by_id() {
		let mut set = WorkerJoinSet::new(TaskClass::Background, "test");
		set.spawn(async { 1u8 });
		let panicking = set.spawn(async {
			if 1 + 1 == 2 {
				panic!("boom");
			}
			2u8
		});
		let results = set.join_all().await;
		assert_eq!(results.len(), 2);
		assert!(results.iter().any(|r| matches!(r, Ok(1))));
		let failed = results.into_iter().find_map(Result::err).unwrap();
		assert!(failed.is_panic());
		assert_eq!(failed.id(), panicking);
	}
}

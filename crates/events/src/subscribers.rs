use std::sync::Arc;

/// Initial capacity of each per-kind list.
const INITIAL_CAPACITY: usize = 64;

/// Ordered subscriber list for one event kind, generic over the callback type.
///
/// Insertion order is call order. Removal keeps the relative order of the
/// remaining entries. Capacity is retained after removals.
pub struct SubscriberList<F: ?Sized> {
	entries: Vec<(u32, Arc<F>)>,
}

impl<F: ?Sized> Default for SubscriberList<F> {
	fn default() -> Self {
		Self {
			entries: Vec::with_capacity(INITIAL_CAPACITY),
		}
	}
}

impl<F: ?Sized> SubscriberList<F> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, seq: u32, callback: Arc<F>) {
		self.entries.push((seq, callback));
	}

	/// Removes the entry with `seq`. Returns false if it was not present.
	pub fn remove(&mut self, seq: u32) -> bool {
		match self.entries.iter().position(|(s, _)| *s == seq) {
			Some(index) => {
				self.entries.remove(index);
				true
			}
			None => false,
		}
	}

	pub fn contains(&self, seq: u32) -> bool {
		self.entries.iter().any(|(s, _)| *s == seq)
	}

	/// Point-in-time copy of the callbacks, in call order.
	pub fn snapshot(&self) -> Vec<Arc<F>> {
		self.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect()
	}

	/// Sequence numbers in call order.
	pub fn seqs(&self) -> Vec<u32> {
		self.entries.iter().map(|(s, _)| *s).collect()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	type Cb = dyn Fn() -> u32 + Send + Sync;

	fn list_with(seqs: &[u32]) -> SubscriberList<Cb> {
		let mut list = SubscriberList::<Cb>::new();
		for &seq in seqs {
			list.push(seq, Arc::new(move || seq));
		}
		list
	}

	#[test]
	fn remove_preserves_relative_order() {
		let mut list = list_with(&[0, 1, 2, 3, 4]);
		assert!(list.remove(2));
		assert!(list.remove(0));
		assert_eq!(list.seqs(), vec![1, 3, 4]);
		let calls: Vec<u32> = list.snapshot().iter().map(|cb| cb()).collect();
		assert_eq!(calls, vec![1, 3, 4]);
	}

	#[test]
	fn remove_missing_is_reported() {
		let mut list = list_with(&[5]);
		assert!(!list.remove(6));
		assert!(list.remove(5));
		assert!(!list.remove(5));
		assert!(list.is_empty());
	}
}

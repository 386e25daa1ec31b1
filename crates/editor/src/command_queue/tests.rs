use super::*;

#[test]
fn batches_arrive_whole_and_in_order() {
	let (tx, mut rx) = channel();

	tx.post_items([CommandItem::new("document_new", [""; 0]), CommandItem::new("alert", ["hi"])]);
	tx.post("quit", [""; 0]);

	let first = rx.try_recv().unwrap();
	assert_eq!(first.len(), 2);
	assert_eq!(first.items[0].name, "document_new");
	assert_eq!(first.items[1].args, vec!["hi".to_string()]);

	let second = rx.try_recv().unwrap();
	assert_eq!(second.items[0].name, "quit");
	assert!(rx.try_recv().is_none());
}

#[test]
fn empty_batches_are_dropped() {
	let (tx, mut rx) = channel();
	tx.post_batch(CommandBatch::default());
	assert!(rx.try_recv().is_none());
}

#[tokio::test]
async fn closed_when_receiver_dropped() {
	let (tx, rx) = channel();
	drop(rx);
	assert!(tx.is_closed());
	tx.post("alert", ["ignored"]);
}

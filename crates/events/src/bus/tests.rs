use std::sync::Arc;

use kiln_primitives::{DocumentId, ViewId, WindowId};
use parking_lot::Mutex;

use super::*;
use crate::{DocumentCreated, ViewCreated, WindowCreated};

type Log = Arc<Mutex<Vec<u32>>>;

fn record(log: &Log, tag: u32, result: bool) -> impl Fn(&WindowCreated) -> bool + Send + Sync + 'static {
	let log = Arc::clone(log);
	move |_| {
		log.lock().push(tag);
		result
	}
}

#[test]
fn delivery_follows_registration_order_minus_removed() {
	let (bus, mut queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let log: Log = Arc::default();

	let a = bus.register(record(&log, 1, true));
	let other = bus.register::<ViewCreated>(|_| true);
	let b = bus.register(record(&log, 2, true));
	let _c = bus.register(record(&log, 3, true));
	bus.unregister(b).unwrap();
	let _d = bus.register(record(&log, 4, true));
	bus.unregister(other).unwrap();

	bus.publish(WindowCreated { window: WindowId(1) });
	assert_eq!(queue.drain(), 1);
	assert_eq!(*log.lock(), vec![1, 3, 4]);

	bus.unregister(a).unwrap();
	log.lock().clear();
	bus.publish(WindowCreated { window: WindowId(2) });
	queue.drain();
	assert_eq!(*log.lock(), vec![3, 4]);
}

#[test]
fn false_return_stops_delivery_after_kth() {
	let (bus, mut queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let log: Log = Arc::default();
	for i in 1..=5 {
		bus.register(record(&log, i, i != 3));
	}

	bus.publish(WindowCreated { window: WindowId(1) });
	queue.drain();
	assert_eq!(*log.lock(), vec![1, 2, 3]);
}

#[test]
fn unknown_id_is_rejected_and_lists_are_untouched() {
	let (bus, _queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let id = bus.register::<DocumentCreated>(|_| true);
	bus.register::<DocumentCreated>(|_| true);

	let bogus = EventId::new(EventKind::DocumentCreated, 99);
	assert_eq!(bus.unregister(bogus), Err(EventError::ListenerNotFound(bogus.to_raw())));
	assert_eq!(bus.unregister_raw(0xff00_0000), Err(EventError::ListenerNotFound(0xff00_0000)));
	assert_eq!(bus.subscriber_count(EventKind::DocumentCreated), 2);

	bus.unregister_raw(id.to_raw()).unwrap();
	assert!(bus.unregister(id).is_err());
	assert_eq!(bus.subscriber_count(EventKind::DocumentCreated), 1);
}

#[test]
fn publish_never_delivers_inline() {
	let (bus, mut queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let log: Log = Arc::default();
	bus.register(record(&log, 1, true));

	bus.publish(WindowCreated { window: WindowId(1) });
	bus.publish(WindowCreated { window: WindowId(2) });
	assert!(log.lock().is_empty());
	assert_eq!(queue.len(), 2);

	queue.drain();
	assert_eq!(*log.lock(), vec![1, 1]);
	assert!(queue.is_empty());
}

#[test]
fn callbacks_may_touch_the_registry() {
	let (bus, mut queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let seen = Arc::new(Mutex::new(Vec::new()));

	let inner_bus = bus.clone();
	let inner_seen = Arc::clone(&seen);
	bus.register::<DocumentCreated>(move |event| {
		let seen = Arc::clone(&inner_seen);
		inner_bus.register::<ViewCreated>(move |view| {
			seen.lock().push(view.view);
			true
		});
		inner_bus.publish(ViewCreated { view: ViewId(event.document.0) });
		true
	});

	bus.publish(DocumentCreated {
		document: DocumentId(7),
		title: "scratch".into(),
	});
	assert_eq!(queue.drain(), 2);
	assert_eq!(*seen.lock(), vec![ViewId(7)]);
}

#[test]
fn ids_are_per_kind_sequences() {
	let (bus, _queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let w0 = bus.register::<WindowCreated>(|_| true);
	let v0 = bus.register::<ViewCreated>(|_| true);
	let w1 = bus.register::<WindowCreated>(|_| true);

	assert_eq!((w0.kind(), w0.seq()), (EventKind::WindowCreated, 0));
	assert_eq!((v0.kind(), v0.seq()), (EventKind::ViewCreated, 0));
	assert_eq!(w1.seq(), 1);
	assert_ne!(w0.to_raw(), v0.to_raw());
}

#[test]
fn publish_after_consumer_dropped_is_silent() {
	let (bus, queue) = EventBus::new(1);
	drop(queue);
	bus.publish(WindowCreated { window: WindowId(1) });
	bus.publish(WindowCreated { window: WindowId(1) });
}

#[tokio::test]
async fn recv_yields_actions_in_publish_order() {
	let (bus, mut queue) = EventBus::new(DEFAULT_HIGH_WATER);
	let log: Log = Arc::default();
	let inner = Arc::clone(&log);
	bus.register::<WindowCreated>(move |event| {
		inner.lock().push(event.window.0);
		true
	});

	for i in 0..3 {
		bus.publish(WindowCreated { window: WindowId(i) });
	}
	for _ in 0..3 {
		queue.recv().await.unwrap().run();
	}
	assert_eq!(*log.lock(), vec![0, 1, 2]);
}

use std::sync::Mutex;
use std::time::Duration;

use serde_json::json;

use super::*;

/// Notifications seen by a handler.
#[derive(Default)]
struct Recorder(Mutex<Vec<(String, JsonValue)>>);

struct Echo(Arc<Recorder>);

impl RequestHandler for Echo {
	fn handle_request(&self, method: &str, params: JsonValue) -> BoxFuture<'static, std::result::Result<JsonValue, ResponseError>> {
		let method = method.to_owned();
		Box::pin(async move {
			match method.as_str() {
				"echo" => Ok(params),
				"slow" => {
					tokio::time::sleep(Duration::from_secs(3600)).await;
					Ok(JsonValue::Null)
				}
				_ => Err(ResponseError::method_not_found(&method)),
			}
		})
	}

	fn handle_notification(&self, method: &str, params: JsonValue) {
		self.0.0.lock().unwrap().push((method.to_owned(), params));
	}
}

fn pair() -> (RpcClient, RpcClient, Arc<Recorder>) {
	let (a, b) = tokio::io::duplex(4096);
	let (a_read, a_write) = tokio::io::split(a);
	let (b_read, b_write) = tokio::io::split(b);
	let recorder = Arc::new(Recorder::default());
	let server_recorder = Arc::clone(&recorder);
	let client = spawn("client", a_read, a_write, |_| Arc::new(NoHandler));
	let server = spawn("server", b_read, b_write, move |_| Arc::new(Echo(server_recorder)));
	(client, server, recorder)
}

#[tokio::test]
async fn call_round_trips_through_handler() {
	let (client, _server, _) = pair();
	let value: JsonValue = client.call("echo", json!({ "a": 1 })).await.unwrap();
	assert_eq!(value, json!({ "a": 1 }));
}

#[tokio::test]
async fn unknown_method_is_a_remote_error() {
	let (client, _server, _) = pair();
	let err = client.call::<_, JsonValue>("missing", ()).await.unwrap_err();
	assert!(matches!(err, Error::Remote(e) if e.code == ResponseError::METHOD_NOT_FOUND));
}

#[tokio::test]
async fn notifications_arrive_in_order() {
	let (client, _server, recorder) = pair();
	for i in 0..3 {
		client.notify("tick", i).unwrap();
	}
	// A call after the notifications acts as a barrier.
	let _: JsonValue = client.call("echo", ()).await.unwrap();
	let seen = recorder.0.lock().unwrap().clone();
	assert_eq!(
		seen,
		vec![("tick".into(), json!(0)), ("tick".into(), json!(1)), ("tick".into(), json!(2))]
	);
}

#[tokio::test]
async fn close_fails_pending_calls() {
	let (client, _server, _) = pair();
	let slow = client.call_deferred::<_, JsonValue>("slow", ());
	let _: JsonValue = client.call("echo", ()).await.unwrap();
	client.close();
	assert!(matches!(slow.await, Err(Error::ConnectionClosed)));
	client.closed().await;
	assert!(client.is_closed());
	assert!(matches!(client.call::<_, JsonValue>("echo", ()).await, Err(Error::ConnectionClosed)));
	assert!(matches!(client.notify("x", ()), Err(Error::ConnectionClosed)));
}

#[tokio::test]
async fn peer_shutdown_closes_the_other_side() {
	let (client, server, _) = pair();
	server.close();
	tokio::time::timeout(Duration::from_secs(5), client.closed())
		.await
		.expect("client endpoint should observe EOF");
}

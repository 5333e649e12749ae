//! End to end over the Unix socket.
//!
//! Covers:
//! - a popup connection round trip (hello, request, delivery)
//! - a page-context ceremony round trip addressed by tab id
//! - a bad hello closes the connection

use crate::backend::{BackendChannel, BackendEvent};
use crate::dispatch::Dispatcher;
use crate::event::RelayEvent;
use crate::gateway::Gateway;
use crate::relay::{event_queue, EventSender, Relay};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Gateway and relay running on a temporary socket, backed by a recording
/// backend.
struct RunningRelay {
    socket_path: PathBuf,
    events: EventSender,
    backend: mpsc::UnboundedReceiver<Value>,
    tasks: Vec<JoinHandle<()>>,
    _temp_dir: TempDir,
}

impl RunningRelay {
    fn start() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("relay.sock");

        let (events, events_rx) = event_queue();
        let (backend_tx, backend) = mpsc::unbounded_channel();
        let relay = Relay::new(Dispatcher::new(BackendChannel::new(backend_tx)), events_rx);

        let gateway = Gateway::new(socket_path.clone(), events.clone());
        let listener = gateway.bind().unwrap();

        let tasks = vec![
            tokio::spawn(async move {
                let _ = gateway.serve_listener(listener).await;
            }),
            tokio::spawn(async move {
                relay.run().await;
            }),
        ];

        Self {
            socket_path,
            events,
            backend,
            tasks,
            _temp_dir: temp_dir,
        }
    }

    async fn connect(&self, hello: Value) -> Client {
        let stream = UnixStream::connect(&self.socket_path).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Client {
            reader: BufReader::new(reader),
            writer,
        };
        client.send(hello).await;
        client
    }

    async fn next_backend_request(&mut self) -> Value {
        timeout(Duration::from_secs(5), self.backend.recv())
            .await
            .expect("backend request timed out")
            .expect("backend queue closed")
    }

    fn backend_reply(&self, response: Value) {
        self.events
            .send(RelayEvent::Backend(BackendEvent::Response(response)))
            .unwrap();
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn send(&mut self, message: Value) {
        let mut line = serde_json::to_vec(&message).unwrap();
        line.push(b'\n');
        self.writer.write_all(&line).await.unwrap();
    }

    async fn read_line(&mut self) -> Option<Value> {
        let mut line = String::new();
        let n = timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("read timed out")
            .unwrap();
        if n == 0 {
            return None;
        }
        Some(serde_json::from_str(line.trim()).unwrap())
    }
}

#[tokio::test]
async fn popup_round_trip() {
    let mut running = RunningRelay::start();
    let mut popup = running.connect(json!({"channel": "popup"})).await;

    popup
        .send(json!({"action": "list", "mode": "auto", "site": "example.com"}))
        .await;

    let request = running.next_backend_request().await;
    assert_eq!(
        request,
        json!({"cmd": "list", "mode": "auto", "site": "example.com"})
    );

    let response = json!({"results": {"cmd": "list", "names": ["alice"]}});
    running.backend_reply(response.clone());

    assert_eq!(popup.read_line().await, Some(response));
}

#[tokio::test]
async fn page_ceremony_round_trip() {
    let mut running = RunningRelay::start();
    let mut page = running.connect(json!({"tab": "21", "active": false})).await;

    page.send(json!({
        "action": "webauthn-get",
        "site": "example.com",
        "id": 8,
        "params": {"challenge": "Y2g", "pk": "cGs"}
    }))
    .await;

    let request = running.next_backend_request().await;
    assert_eq!(request["cmd"], "webauthn-get");
    assert_eq!(request["tabId"], 21);

    let response = json!({"results": {"cmd": "webauthn-get", "tabId": 21, "id": 8}});
    running.backend_reply(response.clone());

    assert_eq!(page.read_line().await, Some(json!({"message": response})));
}

/// Login results reach the page that announced itself active.
#[tokio::test]
async fn active_page_receives_apply() {
    let mut running = RunningRelay::start();
    let mut page = running.connect(json!({"tab": 3})).await;

    // Round trip a ceremony first so the page is known to be registered.
    page.send(json!({"action": "webauthn-create"})).await;
    running.next_backend_request().await;

    running.backend_reply(json!({"results": {"cmd": "login", "name": "alice", "password": "pw"}}));

    assert_eq!(
        page.read_line().await,
        Some(json!({"apply": "login", "args": {"username": "alice", "password": "pw"}}))
    );
}

#[tokio::test]
async fn bad_hello_closes_connection() {
    let running = RunningRelay::start();
    let mut client = running.connect(json!({"who": "me"})).await;

    assert_eq!(client.read_line().await, None);
}

/// A line that is not UTF-8 is skipped and the connection stays up.
#[tokio::test]
async fn non_utf8_line_is_skipped() {
    let mut running = RunningRelay::start();
    let mut popup = running.connect(json!({"channel": "popup"})).await;

    popup.writer.write_all(&[0xff, 0xfe, b'\n']).await.unwrap();
    popup
        .send(json!({"action": "list", "site": "example.com"}))
        .await;

    assert_eq!(
        running.next_backend_request().await,
        json!({"cmd": "list", "site": "example.com"})
    );

    let response = json!({"results": {"cmd": "list", "names": []}});
    running.backend_reply(response.clone());
    assert_eq!(popup.read_line().await, Some(response));
}

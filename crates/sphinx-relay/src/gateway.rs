//! Actor gateway: a Unix socket speaking newline-delimited JSON.
//!
//! Every connection opens with a hello line naming who is on the other end:
//!
//! - `{"channel": "popup"}` registers a named actor channel
//! - `{"tab": 7, "active": true}` registers a page context
//!
//! After the hello, each line from a channel connection is an actor message,
//! and each line from a page connection is a page-initiated request, except
//! `{"focus": true}` which makes that tab the active page. Deliveries go back
//! down the same connection, one JSON object per line.
//!
//! Connection tasks only translate lines into [`RelayEvent`]s.

use crate::error::{RelayError, RelayResult};
use crate::event::RelayEvent;
use crate::relay::EventSender;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sphinx_relay_protocol::TabId;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// First line of every gateway connection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Hello {
    Channel {
        channel: String,
    },
    Page {
        tab: Value,
        #[serde(default = "default_active")]
        active: bool,
    },
}

fn default_active() -> bool {
    true
}

/// Listens for actor connections and feeds them to the relay.
pub struct Gateway {
    socket_path: PathBuf,
    events: EventSender,
}

impl Gateway {
    pub fn new(socket_path: impl Into<PathBuf>, events: EventSender) -> Self {
        Self {
            socket_path: socket_path.into(),
            events,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Bind the socket, replacing a stale one left by a previous run.
    pub fn bind(&self) -> RelayResult<UnixListener> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path.display(), "Gateway listening");
        Ok(listener)
    }

    /// Bind and accept connections until the task is dropped.
    pub async fn serve(self) -> RelayResult<()> {
        let listener = self.bind()?;
        self.serve_listener(listener).await
    }

    /// Accept connections on an already bound listener.
    pub async fn serve_listener(self, listener: UnixListener) -> RelayResult<()> {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, events).await {
                            warn!(error = %e, "Gateway connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept error");
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, events: EventSender) -> RelayResult<()> {
    let (reader, writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let connection_id = Uuid::new_v4();

    let Some(hello) = read_value(&mut reader).await? else {
        debug!(connection_id = %connection_id, "Connection closed before hello");
        return Ok(());
    };
    let hello: Hello = serde_json::from_value(hello)
        .map_err(|e| RelayError::InvalidMessage(format!("bad hello: {}", e)))?;

    match hello {
        Hello::Channel { channel } => {
            serve_channel(channel, connection_id, reader, writer, events).await
        }
        Hello::Page { tab, active } => {
            let tab = TabId::from_value(&tab)
                .ok_or_else(|| RelayError::InvalidMessage(format!("bad tab id: {}", tab)))?;
            serve_page(tab, active, connection_id, reader, writer, events).await
        }
    }
}

async fn serve_channel(
    channel: String,
    connection_id: Uuid,
    mut reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    events: EventSender,
) -> RelayResult<()> {
    let (sender, outbound) = mpsc::unbounded_channel();
    tokio::spawn(write_lines(writer, outbound));

    send_event(
        &events,
        RelayEvent::Connected {
            channel: channel.clone(),
            connection_id,
            sender,
        },
    )?;

    while let Some(payload) = read_value(&mut reader).await? {
        send_event(
            &events,
            RelayEvent::ActorMessage {
                channel: channel.clone(),
                payload,
            },
        )?;
    }

    debug!(channel = %channel, connection_id = %connection_id, "Actor disconnected");
    Ok(())
}

async fn serve_page(
    tab: TabId,
    active: bool,
    connection_id: Uuid,
    mut reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    events: EventSender,
) -> RelayResult<()> {
    let (sender, outbound) = mpsc::unbounded_channel();
    tokio::spawn(write_lines(writer, outbound));

    send_event(
        &events,
        RelayEvent::PageOpened {
            tab,
            connection_id,
            sender,
            active,
        },
    )?;

    let result = async {
        while let Some(payload) = read_value(&mut reader).await? {
            let event = if payload.get("focus") == Some(&Value::Bool(true)) {
                RelayEvent::PageFocused { tab }
            } else {
                RelayEvent::PageRequest { tab, payload }
            };
            send_event(&events, event)?;
        }
        Ok::<(), RelayError>(())
    }
    .await;

    // Tabs die with their connection, whatever ended it.
    let _ = events.send(RelayEvent::PageClosed { tab, connection_id });
    result
}

/// Read the next non-blank JSON line. Lines that are not JSON, including
/// ones that are not UTF-8, are skipped.
async fn read_value(reader: &mut BufReader<OwnedReadHalf>) -> RelayResult<Option<Value>> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => warn!(error = %e, "Skipping malformed gateway line"),
        }
    }
}

fn send_event(events: &EventSender, event: RelayEvent) -> RelayResult<()> {
    events
        .send(event)
        .map_err(|_| RelayError::ChannelClosed("relay event queue".to_string()))
}

async fn write_lines<T: Serialize>(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<T>,
) {
    while let Some(item) = outbound.recv().await {
        let mut line = match serde_json::to_vec(&item) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize delivery");
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = writer.write_all(&line).await {
            debug!(error = %e, "Gateway peer gone, stopping writer");
            break;
        }
    }
}

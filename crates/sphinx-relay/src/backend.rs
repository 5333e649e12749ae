//! Native-messaging channel to the backend process.
//!
//! The backend is spawned as a child process and spoken to over its
//! stdin/stdout with length-prefixed JSON frames. Two tasks own the pipe:
//!
//! - the writer drains an unbounded queue of outgoing requests, in order
//! - the reader turns incoming frames into [`BackendEvent`]s on the relay's
//!   event queue
//!
//! Neither task touches relay state. The [`BackendChannel`] handle held by
//! the dispatcher only queues requests and tracks whether the channel is
//! still usable. There is no reconnection: once broken, it stays broken.

use crate::error::{RelayError, RelayResult};
use crate::event::RelayEvent;
use serde_json::Value;
use sphinx_relay_protocol::{encode_frame, split_frame, BackendRequest, MAX_INBOUND_FRAME_BYTES};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Something the backend channel reports to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// One message from the backend, in emission order.
    Response(Value),
    /// The transport failed. `fatal` errors break the channel for good.
    TransportError { message: String, fatal: bool },
}

/// Lifecycle of the backend channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Broken(String),
}

/// Handle used by the dispatcher to send requests to the backend.
#[derive(Debug)]
pub struct BackendChannel {
    outbound: mpsc::UnboundedSender<Value>,
    state: ChannelState,
}

impl BackendChannel {
    /// Wrap an outgoing queue. Whatever drains `outbound` is the backend.
    pub fn new(outbound: mpsc::UnboundedSender<Value>) -> Self {
        Self {
            outbound,
            state: ChannelState::Open,
        }
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Queue a request. Fire-and-forget: no acknowledgement is awaited.
    pub fn send(&mut self, request: &BackendRequest) -> RelayResult<()> {
        if let ChannelState::Broken(reason) = &self.state {
            return Err(RelayError::BackendUnavailable(reason.clone()));
        }

        let value = request.to_value()?;
        if self.outbound.send(value).is_err() {
            let reason = "Backend writer stopped".to_string();
            self.mark_broken(reason.clone());
            return Err(RelayError::BackendUnavailable(reason));
        }
        Ok(())
    }

    /// Move the channel into its terminal state. The first reason wins.
    pub fn mark_broken(&mut self, reason: impl Into<String>) {
        if self.is_open() {
            self.state = ChannelState::Broken(reason.into());
        }
    }
}

/// Attach a channel to an arbitrary duplex byte stream.
///
/// Incoming events are pushed to `events`. Must be called from within a
/// tokio runtime.
pub fn attach<R, W>(reader: R, writer: W, events: mpsc::UnboundedSender<RelayEvent>) -> BackendChannel
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(writer, outbound_rx, events.clone()));
    tokio::spawn(read_loop(reader, events));
    BackendChannel::new(outbound_tx)
}

/// Spawn the backend executable and attach a channel to its stdio.
///
/// The child is killed when the returned handle is dropped.
pub fn spawn_native_host(
    program: &str,
    args: &[String],
    events: mpsc::UnboundedSender<RelayEvent>,
) -> RelayResult<(BackendChannel, Child)> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RelayError::BackendSpawn {
            program: program.to_string(),
            source,
        })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| RelayError::BackendUnavailable("Backend stdin not captured".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| RelayError::BackendUnavailable("Backend stdout not captured".to_string()))?;

    info!(program, pid = child.id(), "Backend process started");

    Ok((attach(stdout, stdin, events), child))
}

fn report(events: &mpsc::UnboundedSender<RelayEvent>, event: BackendEvent) -> bool {
    events.send(RelayEvent::Backend(event)).is_ok()
}

async fn write_loop<W>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<Value>,
    events: mpsc::UnboundedSender<RelayEvent>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let frame = match encode_frame(&message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode backend request, skipping");
                continue;
            }
        };

        let result = match writer.write_all(&frame).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            report(
                &events,
                BackendEvent::TransportError {
                    message: format!("Failed to write to backend: {}", e),
                    fatal: true,
                },
            );
            return;
        }

        debug!(bytes = frame.len(), "Wrote frame to backend");
    }
}

async fn read_loop<R>(mut reader: R, events: mpsc::UnboundedSender<RelayEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut read_buf: Vec<u8> = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    loop {
        // Drain every complete frame already buffered
        loop {
            let (event, consumed) = match split_frame(&read_buf, MAX_INBOUND_FRAME_BYTES) {
                Ok(Some((payload, consumed))) => (decode_payload(payload), consumed),
                Ok(None) => break,
                Err(e) => {
                    report(
                        &events,
                        BackendEvent::TransportError {
                            message: e.to_string(),
                            fatal: true,
                        },
                    );
                    return;
                }
            };
            read_buf.drain(..consumed);

            if !report(&events, event) {
                return;
            }
        }

        match reader.read(&mut chunk).await {
            Ok(0) => {
                report(
                    &events,
                    BackendEvent::TransportError {
                        message: "Backend closed the channel".to_string(),
                        fatal: true,
                    },
                );
                return;
            }
            Ok(n) => read_buf.extend_from_slice(&chunk[..n]),
            Err(e) => {
                report(
                    &events,
                    BackendEvent::TransportError {
                        message: format!("Failed to read from backend: {}", e),
                        fatal: true,
                    },
                );
                return;
            }
        }
    }
}

fn decode_payload(payload: &[u8]) -> BackendEvent {
    match serde_json::from_slice::<Value>(payload) {
        Ok(value) => BackendEvent::Response(value),
        Err(e) => BackendEvent::TransportError {
            message: format!("Malformed backend message: {}", e),
            fatal: false,
        },
    }
}

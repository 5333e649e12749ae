//! Registry of connected actor channels.
//!
//! Channels are keyed by name. Registering a name that already exists
//! replaces the old handle (the actor reconnected). Entries are never
//! removed: a channel whose actor went away stays registered until the
//! same name connects again, and deliveries to it fail quietly.

use crate::error::{RelayError, RelayResult};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Sending half of an actor's delivery queue.
pub type ActorSender = mpsc::UnboundedSender<Value>;

/// A connected actor channel.
#[derive(Debug, Clone)]
pub struct ActorChannel {
    name: String,
    connection_id: Uuid,
    sender: ActorSender,
}

impl ActorChannel {
    pub fn new(name: impl Into<String>, connection_id: Uuid, sender: ActorSender) -> Self {
        Self {
            name: name.into(),
            connection_id,
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Queue a message for the actor.
    pub fn send(&self, message: Value) -> RelayResult<()> {
        self.sender
            .send(message)
            .map_err(|_| RelayError::ChannelClosed(self.name.clone()))
    }
}

/// Name-to-channel mapping for in-process actors.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, ActorChannel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel, replacing any existing entry with the same name.
    ///
    /// Returns the replaced channel, if any.
    pub fn register(&mut self, channel: ActorChannel) -> Option<ActorChannel> {
        debug!(
            channel = %channel.name,
            connection_id = %channel.connection_id,
            "Registering actor channel"
        );
        self.channels.insert(channel.name.clone(), channel)
    }

    pub fn get(&self, name: &str) -> Option<&ActorChannel> {
        self.channels.get(name)
    }

    /// Deliver a message to the named channel.
    ///
    /// Returns `false` if no such channel is registered or its actor has gone
    /// away. Neither case is an error for the caller.
    pub fn deliver(&self, name: &str, message: Value) -> bool {
        let Some(channel) = self.channels.get(name) else {
            debug!(channel = %name, "No actor channel registered, dropping delivery");
            return false;
        };

        match channel.send(message) {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    channel = %name,
                    connection_id = %channel.connection_id,
                    error = %e,
                    "Actor channel closed, dropping delivery"
                );
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

//! Events consumed by the relay's single event loop.

use crate::backend::BackendEvent;
use crate::pages::PageSender;
use crate::registry::ActorSender;
use serde_json::Value;
use sphinx_relay_protocol::TabId;
use uuid::Uuid;

/// One unit of work for the dispatcher.
///
/// Connection tasks and the backend reader only produce these; all state
/// changes happen when the event loop handles them, one at a time.
#[derive(Debug)]
pub enum RelayEvent {
    /// An actor channel connected (or reconnected) under `channel`.
    Connected {
        channel: String,
        connection_id: Uuid,
        sender: ActorSender,
    },
    /// A message arrived on a named actor channel.
    ActorMessage { channel: String, payload: Value },
    /// A page context connected.
    PageOpened {
        tab: TabId,
        connection_id: Uuid,
        sender: PageSender,
        active: bool,
    },
    /// A page context became the active page.
    PageFocused { tab: TabId },
    /// A page context's connection went away.
    PageClosed { tab: TabId, connection_id: Uuid },
    /// A page-initiated request (synchronous bridge).
    PageRequest { tab: TabId, payload: Value },
    /// Something from the backend channel.
    Backend(BackendEvent),
}

impl RelayEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEvent::Connected { .. } => "connected",
            RelayEvent::ActorMessage { .. } => "actor_message",
            RelayEvent::PageOpened { .. } => "page_opened",
            RelayEvent::PageFocused { .. } => "page_focused",
            RelayEvent::PageClosed { .. } => "page_closed",
            RelayEvent::PageRequest { .. } => "page_request",
            RelayEvent::Backend(_) => "backend",
        }
    }
}

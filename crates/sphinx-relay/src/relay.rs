//! The relay event loop.

use crate::dispatch::Dispatcher;
use crate::event::RelayEvent;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Sending half of the relay's event queue, handed to every I/O task.
pub type EventSender = mpsc::UnboundedSender<RelayEvent>;

/// Create the relay's event queue.
pub fn event_queue() -> (EventSender, mpsc::UnboundedReceiver<RelayEvent>) {
    mpsc::unbounded_channel()
}

/// Drains the event queue into the dispatcher.
///
/// Exactly one event is processed to completion before the next is
/// dequeued. The dispatcher never awaits, so a slow actor or backend can
/// only delay the queue, never interleave with it.
pub struct Relay {
    dispatcher: Dispatcher,
    events: mpsc::UnboundedReceiver<RelayEvent>,
}

impl Relay {
    pub fn new(dispatcher: Dispatcher, events: mpsc::UnboundedReceiver<RelayEvent>) -> Self {
        Self { dispatcher, events }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run until every event sender has been dropped.
    pub async fn run(mut self) -> Dispatcher {
        info!("Relay event loop started");

        while let Some(event) = self.events.recv().await {
            debug!(event = event.kind(), "Handling event");
            self.dispatcher.handle(event);
        }

        info!("Event queue closed, relay stopping");
        self.dispatcher
    }
}

//! sphinx-relay: message relay between browser actors and the WebSphinx
//! credential backend.
//!
//! The relay connects three kinds of actor (the popup control surface, the
//! content script, and individual page contexts) to a single
//! native-messaging backend process. It translates actor requests into
//! backend commands, stitches the two-step credential change together, and
//! routes every backend reply to the right actor.
//!
//! # Core Invariants
//!
//! 1. **One event at a time**: all state lives in the [`Dispatcher`], which is
//!    driven by a single event loop and never awaits
//! 2. **Typed requests**: a backend request carries only the fields its
//!    command needs; passwords are never forwarded
//! 3. **No reconnection**: a broken backend channel leaves the relay
//!    unavailable; every later request is answered with an error
//! 4. **Two kinds of page addressing**: ceremony replies and failure echoes go
//!    to an explicit tab id, login/create/change results go to the active page
//!
//! # Architecture
//!
//! ```text
//! gateway (Unix socket) --\                      /--> backend writer
//!                          +--> event queue --> Dispatcher
//! backend reader ---------/                      \--> actor/page queues
//! ```

pub mod backend;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod gateway;
pub mod normalize;
pub mod pages;
pub mod registry;
pub mod relay;
pub mod session;

#[cfg(test)]
mod tests;

pub use backend::{attach, spawn_native_host, BackendChannel, BackendEvent, ChannelState};
pub use bridge::{bridge_request, BridgeOutcome};
pub use config::RelayConfig;
pub use dispatch::Dispatcher;
pub use error::{RelayError, RelayResult};
pub use event::RelayEvent;
pub use gateway::{Gateway, Hello};
pub use pages::{PageDelivery, PageTable};
pub use registry::{ActorChannel, ChannelRegistry};
pub use relay::{event_queue, EventSender, Relay};
pub use session::{ChangeCursor, SessionState};

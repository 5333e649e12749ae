//! Wire types for the WebSphinx relay.
//!
//! The relay sits between three kinds of actors and one backend process:
//!
//! ```text
//! popup ----------\
//! content-script --+--> relay --(native messaging)--> backend
//! page context ---/      ^                               |
//!                        |_______________________________|
//! ```
//!
//! This crate holds only the message shapes and the frame codec. It performs
//! no I/O and keeps no state; routing lives in `sphinx-relay`.

pub mod actor;
pub mod command;
pub mod error;
pub mod frame;
pub mod page;
pub mod request;
pub mod response;

pub use actor::{
    CeremonyMessage, CeremonyParams, ControlSurfaceMessage, CONTENT_SCRIPT, CONTROL_SURFACE,
    MANUAL_MODE,
};
pub use command::{Command, ControlAction};
pub use error::{ProtocolError, ProtocolResult};
pub use frame::{encode_frame, split_frame, LENGTH_PREFIX_BYTES, MAX_INBOUND_FRAME_BYTES};
pub use page::{Account, CredentialChange, OldSecret, PageAction};
pub use request::{
    AccountRequest, BackendRequest, CeremonyRequest, ChangeContinuation, CreateRequest, ListRequest,
    WebauthnFields, WebauthnRequest,
};
pub use response::{classify, failure_echo, ResponseKind, TabId, FAIL_MARKER};

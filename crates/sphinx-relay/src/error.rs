//! Error types for the relay.

use thiserror::Error;

/// Relay error type.
#[derive(Error, Debug)]
pub enum RelayError {
    /// IO error (socket, pipe, file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (framing, unknown commands)
    #[error("Protocol error: {0}")]
    Protocol(#[from] sphinx_relay_protocol::ProtocolError),

    /// Malformed actor handshake or message
    #[error("Invalid actor message: {0}")]
    InvalidMessage(String),

    /// The backend channel is broken; nothing more will be sent
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend process could not be started
    #[error("Failed to start backend {program}: {source}")]
    BackendSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An actor or internal channel has no receiver left
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using RelayError.
pub type RelayResult<T> = Result<T, RelayError>;

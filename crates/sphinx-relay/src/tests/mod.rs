//! Engine tests for the relay.
//!
//! - `harness.rs`          - TestRelay with recording backend, actors and pages
//! - `normalization.rs`    - Actor requests to backend commands
//! - `change_flow.rs`      - Two-step credential change and the shared cursor
//! - `failures.rs`         - Command failure echoes
//! - `routing.rs`          - Response precedence and destinations
//! - `reconnect.rs`        - Channel replacement and page lifecycle
//! - `transport_failure.rs` - Broken backend channel
//! - `bridge.rs`           - Page-initiated webauthn ceremonies
//! - `gateway.rs`          - End to end over the Unix socket

mod failures;
mod gateway;
mod reconnect;

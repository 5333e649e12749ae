//! Cursor for the two-phase credential change.
//!
//! The backend has no multi-step transactions, so an automatic change is
//! stitched together by the relay:
//!
//! ```text
//! Empty --begin_change--> AwaitingOldSecret --capture--> HoldingOldSecret
//!   ^                                                          |
//!   |______________________ complete ___________________________|
//! ```
//!
//! There is one cursor per relay. Two change flows in flight at the same
//! time share it, and the later flow overwrites the earlier one's state.
//! Nothing here is persisted; a restart mid-flow loses the change.

use sphinx_relay_protocol::OldSecret;
use tracing::{debug, warn};

/// Where the relay is in a credential change.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ChangeCursor {
    /// No change in progress.
    #[default]
    Empty,
    /// A change was requested; the next `login` reply carries the old secret.
    AwaitingOldSecret,
    /// The old secret is held until the `change` reply arrives.
    HoldingOldSecret(OldSecret),
}

impl ChangeCursor {
    fn label(&self) -> &'static str {
        match self {
            ChangeCursor::Empty => "empty",
            ChangeCursor::AwaitingOldSecret => "awaiting-old-secret",
            ChangeCursor::HoldingOldSecret(_) => "holding-old-secret",
        }
    }
}

/// Process-wide session state owned by the dispatcher.
#[derive(Debug, Default)]
pub struct SessionState {
    cursor: ChangeCursor,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> &ChangeCursor {
        &self.cursor
    }

    pub fn is_awaiting_old_secret(&self) -> bool {
        self.cursor == ChangeCursor::AwaitingOldSecret
    }

    /// Drop any change in progress. Used when the popup starts a plain login.
    pub fn clear(&mut self) {
        if self.cursor != ChangeCursor::Empty {
            debug!(from = self.cursor.label(), "Clearing change cursor");
        }
        self.cursor = ChangeCursor::Empty;
    }

    /// Start an automatic change.
    pub fn begin_change(&mut self) {
        if self.cursor != ChangeCursor::Empty {
            warn!(
                from = self.cursor.label(),
                "Credential change started while another is in progress"
            );
        }
        self.cursor = ChangeCursor::AwaitingOldSecret;
    }

    /// Hold the old secret returned by the implicit login.
    ///
    /// Returns `false` (and leaves the cursor alone) unless a change was
    /// awaiting it.
    pub fn capture(&mut self, secret: OldSecret) -> bool {
        if self.cursor != ChangeCursor::AwaitingOldSecret {
            return false;
        }
        self.cursor = ChangeCursor::HoldingOldSecret(secret);
        true
    }

    /// Finish a change: hand back the held secret and reset to empty.
    pub fn complete(&mut self) -> Option<OldSecret> {
        match std::mem::take(&mut self.cursor) {
            ChangeCursor::HoldingOldSecret(secret) => Some(secret),
            other => {
                warn!(
                    from = other.label(),
                    "Change completed without a captured old secret"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn secret(pw: &str) -> OldSecret {
        OldSecret {
            password: Some(json!(pw)),
        }
    }

    #[test]
    fn test_starts_empty() {
        assert_eq!(SessionState::new().cursor(), &ChangeCursor::Empty);
    }

    #[test]
    fn test_full_cycle() {
        let mut state = SessionState::new();

        state.begin_change();
        assert!(state.is_awaiting_old_secret());

        assert!(state.capture(secret("old")));
        assert_eq!(state.cursor(), &ChangeCursor::HoldingOldSecret(secret("old")));

        assert_eq!(state.complete(), Some(secret("old")));
        assert_eq!(state.cursor(), &ChangeCursor::Empty);
    }

    #[test]
    fn test_capture_requires_awaiting() {
        let mut state = SessionState::new();
        assert!(!state.capture(secret("x")));
        assert_eq!(state.cursor(), &ChangeCursor::Empty);
    }

    #[test]
    fn test_complete_without_secret_resets() {
        let mut state = SessionState::new();
        state.begin_change();

        assert_eq!(state.complete(), None);
        assert_eq!(state.cursor(), &ChangeCursor::Empty);
    }

    #[test]
    fn test_clear_drops_held_secret() {
        let mut state = SessionState::new();
        state.begin_change();
        state.capture(secret("old"));

        state.clear();
        assert_eq!(state.cursor(), &ChangeCursor::Empty);
    }

    #[test]
    fn test_begin_change_overwrites_held_secret() {
        let mut state = SessionState::new();
        state.begin_change();
        state.capture(secret("first"));

        state.begin_change();
        assert_eq!(state.cursor(), &ChangeCursor::AwaitingOldSecret);
    }
}

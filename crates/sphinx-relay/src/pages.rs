//! Page contexts (browser tabs) known to the relay.
//!
//! Tabs are addressed two ways: by explicit id for ceremony replies and
//! failure echoes, and as "the active page" for login, create and change
//! results. The two are deliberately kept apart.

use serde::Serialize;
use serde_json::Value;
use sphinx_relay_protocol::{PageAction, TabId};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// What a page context receives from the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageDelivery {
    /// A backend response routed to this tab by id.
    Message { message: Value },
    /// An instruction for the active page.
    Apply(PageAction),
}

/// Sending half of a page context's delivery queue.
pub type PageSender = mpsc::UnboundedSender<PageDelivery>;

#[derive(Debug)]
struct PageEntry {
    connection_id: Uuid,
    sender: PageSender,
}

/// Open page contexts and which one is active.
#[derive(Debug, Default)]
pub struct PageTable {
    pages: HashMap<TabId, PageEntry>,
    active: Option<TabId>,
}

impl PageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly connected page context.
    pub fn open(&mut self, tab: TabId, connection_id: Uuid, sender: PageSender, active: bool) {
        debug!(tab = %tab, connection_id = %connection_id, active, "Page context opened");
        self.pages.insert(
            tab,
            PageEntry {
                connection_id,
                sender,
            },
        );
        if active {
            self.active = Some(tab);
        }
    }

    /// Mark a tab as the active page.
    pub fn focus(&mut self, tab: TabId) {
        if self.pages.contains_key(&tab) {
            self.active = Some(tab);
        } else {
            debug!(tab = %tab, "Focus for unknown page context ignored");
        }
    }

    /// Forget a page context, but only if `connection_id` still owns it.
    pub fn close(&mut self, tab: TabId, connection_id: Uuid) {
        let owned = self
            .pages
            .get(&tab)
            .is_some_and(|entry| entry.connection_id == connection_id);
        if !owned {
            return;
        }

        self.pages.remove(&tab);
        if self.active == Some(tab) {
            self.active = None;
        }
        debug!(tab = %tab, connection_id = %connection_id, "Page context closed");
    }

    pub fn active(&self) -> Option<TabId> {
        self.active
    }

    pub fn contains(&self, tab: TabId) -> bool {
        self.pages.contains_key(&tab)
    }

    /// Deliver a message to a specific tab.
    pub fn send_to(&self, tab: TabId, message: Value) -> bool {
        self.deliver(tab, PageDelivery::Message { message })
    }

    /// Apply an instruction to the active page.
    pub fn apply_to_active(&self, action: PageAction) -> bool {
        let Some(tab) = self.active else {
            debug!(action = action.kind(), "No active page, dropping instruction");
            return false;
        };
        self.deliver(tab, PageDelivery::Apply(action))
    }

    fn deliver(&self, tab: TabId, delivery: PageDelivery) -> bool {
        let Some(entry) = self.pages.get(&tab) else {
            debug!(tab = %tab, "Unknown page context, dropping delivery");
            return false;
        };

        if entry.sender.send(delivery).is_err() {
            debug!(tab = %tab, "Page context closed, dropping delivery");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sphinx_relay_protocol::Account;

    fn login_action() -> PageAction {
        PageAction::Login(Account {
            username: Some(json!("alice")),
            password: Some(json!("pw")),
        })
    }

    #[test]
    fn test_send_to_tab() {
        let mut pages = PageTable::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pages.open(TabId(7), Uuid::new_v4(), tx, false);

        assert!(pages.send_to(TabId(7), json!({"results": {}})));
        assert_eq!(
            rx.try_recv().unwrap(),
            PageDelivery::Message {
                message: json!({"results": {}})
            }
        );
        assert!(!pages.send_to(TabId(8), json!({})));
    }

    #[test]
    fn test_apply_targets_active_page_only() {
        let mut pages = PageTable::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pages.open(TabId(1), Uuid::new_v4(), tx1, true);
        pages.open(TabId(2), Uuid::new_v4(), tx2, false);

        assert!(pages.apply_to_active(login_action()));
        assert!(matches!(rx1.try_recv().unwrap(), PageDelivery::Apply(_)));
        assert!(rx2.try_recv().is_err());

        pages.focus(TabId(2));
        assert!(pages.apply_to_active(login_action()));
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_apply_without_active_page() {
        let pages = PageTable::new();
        assert!(!pages.apply_to_active(login_action()));
    }

    #[test]
    fn test_close_requires_owning_connection() {
        let mut pages = PageTable::new();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, _new_rx) = mpsc::unbounded_channel();
        let old_id = Uuid::new_v4();
        let new_id = Uuid::new_v4();

        pages.open(TabId(3), old_id, old_tx, true);
        pages.open(TabId(3), new_id, new_tx, true);

        pages.close(TabId(3), old_id);
        assert!(pages.contains(TabId(3)));
        assert_eq!(pages.active(), Some(TabId(3)));

        pages.close(TabId(3), new_id);
        assert!(!pages.contains(TabId(3)));
        assert_eq!(pages.active(), None);
    }

    #[test]
    fn test_delivery_wire_format() {
        let message = PageDelivery::Message {
            message: json!({"results": {"cmd": "webauthn-get"}}),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"message": {"results": {"cmd": "webauthn-get"}}})
        );

        let apply = PageDelivery::Apply(login_action());
        assert_eq!(serde_json::to_value(&apply).unwrap()["apply"], "login");
    }
}

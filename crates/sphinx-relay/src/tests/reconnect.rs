//! Channel replacement and page lifecycle.
//!
//! Covers:
//! - re-registering a channel name replaces the handle
//! - stale channel entries are kept, not removed
//! - a page closed by an old connection survives its replacement

use super::harness::TestRelay;
use crate::event::RelayEvent;
use serde_json::json;
use sphinx_relay_protocol::TabId;
use uuid::Uuid;

/// After a reconnect, deliveries reach only the new handle.
#[test]
fn reconnect_replaces_popup_handle() {
    let mut relay = TestRelay::new();
    let mut old_popup = relay.connect_popup();
    let mut new_popup = relay.connect_popup();

    relay.backend_reply(json!({"results": {"cmd": "list", "names": []}}));

    old_popup.assert_empty();
    assert_eq!(new_popup.drain().len(), 1);
    assert_eq!(relay.dispatcher.channels().len(), 1);
}

/// A popup that went away stays registered; deliveries fail quietly.
#[test]
fn stale_channel_is_kept() {
    let mut relay = TestRelay::new();
    let popup = relay.connect_popup();
    drop(popup);

    relay.backend_reply(json!({"results": {"cmd": "commit"}}));

    assert!(relay.dispatcher.channels().get("popup").is_some());
}

/// Closing a tab through a superseded connection leaves the new one alone.
#[test]
fn page_reopen_survives_old_close() {
    let mut relay = TestRelay::new();
    let old_id = Uuid::new_v4();
    let new_id = Uuid::new_v4();

    let _old = relay.open_page_with_id(4, true, old_id);
    let mut new = relay.open_page_with_id(4, true, new_id);

    relay.dispatcher.handle(RelayEvent::PageClosed {
        tab: TabId(4),
        connection_id: old_id,
    });
    assert!(relay.dispatcher.pages().contains(TabId(4)));

    relay.backend_reply(json!({"results": {"cmd": "create", "name": "alice", "password": "p"}}));
    assert_eq!(new.applies().len(), 1);

    relay.dispatcher.handle(RelayEvent::PageClosed {
        tab: TabId(4),
        connection_id: new_id,
    });
    assert!(!relay.dispatcher.pages().contains(TabId(4)));
    assert_eq!(relay.dispatcher.pages().active(), None);
}

//! Command failure echoes.
//!
//! Covers:
//! - a failure naming a command is echoed to the page in `tabId`
//! - a failure without a command reaches nobody
//! - a failure never reaches the control surface

use super::harness::TestRelay;
use serde_json::json;

/// `results: "fail"` with `cmd`, `tabId` and `id` produces one echo to that tab.
#[test]
fn failure_echoed_to_originating_tab() {
    let mut relay = TestRelay::new();
    let mut popup = relay.connect_popup();
    let mut tab7 = relay.open_page(7, false);
    let mut active = relay.open_page(8, true);

    relay.backend_reply(json!({"results": "fail", "cmd": "webauthn-get", "tabId": 7, "id": 42}));

    let messages = tab7.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0]["results"],
        json!({"error": true, "id": 42, "cmd": "webauthn-get"})
    );
    assert_eq!(messages[0]["tabId"], 7);

    popup.assert_empty();
    active.assert_empty();
}

/// A failure without `cmd` is logged and dropped.
#[test]
fn failure_without_command_reaches_nobody() {
    let mut relay = TestRelay::new();
    let mut popup = relay.connect_popup();
    let mut page = relay.open_page(7, true);

    relay.backend_reply(json!({"results": "fail", "tabId": 7, "id": 42}));

    popup.assert_empty();
    page.assert_empty();
    relay.backend.assert_empty();
}

/// Tab ids sent as numeric strings are accepted.
#[test]
fn failure_with_string_tab_id() {
    let mut relay = TestRelay::new();
    let mut page = relay.open_page(12, false);

    relay.backend_reply(json!({"results": "fail", "cmd": "create", "tabId": "12"}));

    let messages = page.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["results"], json!({"error": true, "cmd": "create"}));
}

/// Without a usable tab id there is nowhere to send the echo.
#[test]
fn failure_without_tab_is_dropped() {
    let mut relay = TestRelay::new();
    let mut popup = relay.connect_popup();
    let mut page = relay.open_page(1, true);

    relay.backend_reply(json!({"results": "fail", "cmd": "login"}));
    relay.backend_reply(json!({"results": "fail", "cmd": "login", "tabId": "tab-one"}));

    popup.assert_empty();
    page.assert_empty();
}

/// A failed change does not reset the cursor.
#[test]
fn failure_leaves_change_cursor() {
    let mut relay = TestRelay::new();
    relay.popup(json!({"action": "change", "site": "example.com", "name": "alice"}));

    relay.backend_reply(json!({"results": "fail", "cmd": "login", "tabId": 1}));

    assert!(relay.dispatcher.session().is_awaiting_old_secret());
}

//! Inbound normalization: actor messages to backend requests.
//!
//! These are pure functions. Session state is handled by the dispatcher,
//! which decides whether a control-surface `change` is rewritten to `login`
//! before calling in here.

use sphinx_relay_protocol::{
    AccountRequest, BackendRequest, CeremonyMessage, CeremonyRequest, ControlAction,
    ControlSurfaceMessage, CreateRequest, ListRequest,
};

/// Build the backend request for a control-surface action.
///
/// `list` never carries a name; `create` alone carries rules and size.
pub fn normalize_control_surface(
    action: ControlAction,
    message: &ControlSurfaceMessage,
) -> BackendRequest {
    let mode = message.mode.clone();
    let site = message.site.clone();
    let name = message.name.clone();

    match action {
        ControlAction::List => BackendRequest::List(ListRequest::new(mode, site)),
        ControlAction::Login => BackendRequest::Account(AccountRequest::login(mode, site, name)),
        ControlAction::Change => {
            BackendRequest::Account(AccountRequest::change(mode, site, name))
        }
        ControlAction::Commit => {
            BackendRequest::Account(AccountRequest::commit(mode, site, name))
        }
        ControlAction::Create => BackendRequest::Create(CreateRequest::new(
            mode,
            site,
            name,
            message.rules.clone(),
            message.size.clone(),
        )),
    }
}

/// Build the backend request for a content-script ceremony message.
///
/// No command whitelist applies here: the action is passed through as-is.
/// `params.challenge` becomes `challenge` and `params.username` becomes
/// `name`.
pub fn normalize_content_script(message: &CeremonyMessage) -> BackendRequest {
    let params = message.params();

    BackendRequest::Ceremony(CeremonyRequest {
        cmd: message.action.clone().unwrap_or_default(),
        mode: message.mode.clone(),
        site: message.site.clone(),
        challenge: params.challenge,
        name: params.username,
        id: message.id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn popup(value: serde_json::Value) -> ControlSurfaceMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_name_present_except_for_list() {
        let base = json!({
            "mode": "auto",
            "site": "example.com",
            "name": "alice",
            "rules": "uld",
            "size": 16
        });

        for action in [
            ControlAction::List,
            ControlAction::Login,
            ControlAction::Create,
            ControlAction::Change,
            ControlAction::Commit,
        ] {
            let value = normalize_control_surface(action, &popup(base.clone()))
                .to_value()
                .unwrap();

            assert_eq!(value["cmd"], action.command().as_str());
            assert_eq!(value["site"], "example.com");
            assert_eq!(value["mode"], "auto");
            if action == ControlAction::List {
                assert!(value.get("name").is_none());
            } else {
                assert_eq!(value["name"], "alice");
            }
        }
    }

    #[test]
    fn test_only_create_carries_rules_and_size() {
        let message = popup(json!({"action": "login", "name": "a", "rules": "uld", "size": 8}));

        let login = normalize_control_surface(ControlAction::Login, &message)
            .to_value()
            .unwrap();
        assert!(login.get("rules").is_none());
        assert!(login.get("size").is_none());

        let create = normalize_control_surface(ControlAction::Create, &message)
            .to_value()
            .unwrap();
        assert_eq!(create["rules"], "uld");
        assert_eq!(create["size"], 8);
    }

    #[test]
    fn test_content_script_renames_params() {
        let message: CeremonyMessage = serde_json::from_value(json!({
            "action": "get",
            "mode": "auto",
            "site": "example.com",
            "id": 5,
            "params": {"challenge": "Y2hhbA", "username": "bob", "pk": "ignored"}
        }))
        .unwrap();

        let value = normalize_content_script(&message).to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "cmd": "get",
                "mode": "auto",
                "site": "example.com",
                "challenge": "Y2hhbA",
                "name": "bob",
                "id": 5
            })
        );
    }

    #[test]
    fn test_content_script_without_params() {
        let message: CeremonyMessage =
            serde_json::from_value(json!({"action": "create", "site": "example.com"})).unwrap();

        let value = normalize_content_script(&message).to_value().unwrap();
        assert_eq!(value, json!({"cmd": "create", "site": "example.com"}));
    }
}

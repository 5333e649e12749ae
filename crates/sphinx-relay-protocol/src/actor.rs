//! Messages sent by actors to the relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel name of the popup control surface.
pub const CONTROL_SURFACE: &str = "popup";

/// Channel name of the in-page content script.
pub const CONTENT_SCRIPT: &str = "content-script";

/// Mode value marking a UI-driven flow the relay must not interpret.
pub const MANUAL_MODE: &str = "manual";

/// A request from the control surface.
///
/// `action` is kept as a string so unknown actions can be logged before
/// they are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSurfaceMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
}

impl ControlSurfaceMessage {
    /// Whether the popup drives this flow itself.
    pub fn is_manual(&self) -> bool {
        self.mode.as_ref().and_then(Value::as_str) == Some(MANUAL_MODE)
    }
}

/// A credential-ceremony request, either from the content-script channel or
/// directly from a page context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CeremonyMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    /// Ceremony identifier chosen by the page, echoed back on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<CeremonyParams>,
}

impl CeremonyMessage {
    /// Parameters, or an empty set when the page sent none.
    pub fn params(&self) -> CeremonyParams {
        self.params.clone().unwrap_or_default()
    }

    /// Whether the action names a webauthn ceremony.
    pub fn is_webauthn(&self) -> bool {
        self.action
            .as_deref()
            .is_some_and(|action| action.starts_with("webauthn"))
    }
}

/// Ceremony parameters. Encodings are opaque to the relay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CeremonyParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Value>,
    #[serde(rename = "clientDataJSON", default, skip_serializing_if = "Option::is_none")]
    pub client_data_json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<Value>,
}

//! Requests sent from the relay to the backend.
//!
//! Each variant carries only the fields its command needs, so a request can
//! never leak fields that belong to another command. All variants serialize
//! to a flat JSON object keyed by `cmd`.

use crate::command::Command;
use crate::response::TabId;
use serde::Serialize;
use serde_json::{Map, Value};

/// A request bound for the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BackendRequest {
    List(ListRequest),
    Account(AccountRequest),
    Create(CreateRequest),
    Ceremony(CeremonyRequest),
    Webauthn(WebauthnRequest),
    ChangeContinuation(ChangeContinuation),
}

impl BackendRequest {
    /// The `cmd` discriminant as it will appear on the wire.
    pub fn cmd(&self) -> &str {
        match self {
            BackendRequest::List(req) => req.cmd.as_str(),
            BackendRequest::Account(req) => req.cmd.as_str(),
            BackendRequest::Create(req) => req.cmd.as_str(),
            BackendRequest::Ceremony(req) => &req.cmd,
            BackendRequest::Webauthn(req) => req.cmd.as_str(),
            BackendRequest::ChangeContinuation(_) => Command::Change.as_str(),
        }
    }

    /// Serialize into the flat JSON object written to the backend.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// `list`: enumerate accounts for a site. Never carries a name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListRequest {
    cmd: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
}

impl ListRequest {
    pub fn new(mode: Option<Value>, site: Option<Value>) -> Self {
        Self {
            cmd: Command::List,
            mode,
            site,
        }
    }
}

/// `login`, `change` or `commit` against a named account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountRequest {
    cmd: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
}

impl AccountRequest {
    pub fn login(mode: Option<Value>, site: Option<Value>, name: Option<Value>) -> Self {
        Self::with_command(Command::Login, mode, site, name)
    }

    pub fn change(mode: Option<Value>, site: Option<Value>, name: Option<Value>) -> Self {
        Self::with_command(Command::Change, mode, site, name)
    }

    pub fn commit(mode: Option<Value>, site: Option<Value>, name: Option<Value>) -> Self {
        Self::with_command(Command::Commit, mode, site, name)
    }

    fn with_command(
        cmd: Command,
        mode: Option<Value>,
        site: Option<Value>,
        name: Option<Value>,
    ) -> Self {
        Self {
            cmd,
            mode,
            site,
            name,
        }
    }

    pub fn command(&self) -> Command {
        self.cmd
    }
}

/// `create`: derive a new credential with the given rules and size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRequest {
    cmd: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
}

impl CreateRequest {
    pub fn new(
        mode: Option<Value>,
        site: Option<Value>,
        name: Option<Value>,
        rules: Option<Value>,
        size: Option<Value>,
    ) -> Self {
        Self {
            cmd: Command::Create,
            mode,
            site,
            name,
            rules,
            size,
        }
    }
}

/// A ceremony request relayed from the content-script channel.
///
/// The command name is passed through unchecked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CeremonyRequest {
    pub cmd: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// A webauthn ceremony initiated by a page context.
///
/// `tabId` is captured from the sender so the reply can find its way back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebauthnRequest {
    cmd: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<Value>,
    #[serde(rename = "clientDataJSON", skip_serializing_if = "Option::is_none")]
    pub client_data_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pk: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userid: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "tabId")]
    pub tab_id: TabId,
}

/// Fields shared by both webauthn ceremonies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebauthnFields {
    pub mode: Option<Value>,
    pub site: Option<Value>,
    pub client_data_json: Option<Value>,
    pub challenge: Option<Value>,
    pub name: Option<Value>,
    pub userid: Option<Value>,
    pub id: Option<Value>,
}

impl WebauthnRequest {
    /// A credential-creation ceremony. Never carries a public key.
    pub fn create(fields: WebauthnFields, tab_id: TabId) -> Self {
        Self::build(Command::WebauthnCreate, fields, None, tab_id)
    }

    /// A credential-assertion ceremony against a known public key.
    pub fn get(fields: WebauthnFields, pk: Option<Value>, tab_id: TabId) -> Self {
        Self::build(Command::WebauthnGet, fields, pk, tab_id)
    }

    fn build(cmd: Command, fields: WebauthnFields, pk: Option<Value>, tab_id: TabId) -> Self {
        Self {
            cmd,
            mode: fields.mode,
            site: fields.site,
            client_data_json: fields.client_data_json,
            challenge: fields.challenge,
            pk,
            name: fields.name,
            userid: fields.userid,
            id: fields.id,
            tab_id,
        }
    }

    pub fn command(&self) -> Command {
        self.cmd
    }

    pub fn pk(&self) -> Option<&Value> {
        self.pk.as_ref()
    }
}

/// Second half of an automatic credential change.
///
/// Built from the backend's reply to the implicit `login`: the reply is sent
/// back with `cmd` rewritten to `change` and the current password removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeContinuation {
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl ChangeContinuation {
    /// Split a login result into the continuation request and the captured
    /// password (if the backend returned one).
    pub fn from_login_result(mut results: Map<String, Value>) -> (Self, Option<Value>) {
        let password = results.remove("password");
        results.insert(
            "cmd".to_string(),
            Value::String(Command::Change.as_str().to_string()),
        );
        (Self { fields: results }, password)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

//! Instructions applied to the active page.
//!
//! Login, create and change results are applied to whichever page is
//! currently active rather than to a tab named in the message. Ceremony
//! replies go the other way: they always carry an explicit tab id.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Credentials to fill into the active page.
#[derive(Clone, PartialEq, Serialize)]
pub struct Account {
    pub username: Option<Value>,
    pub password: Option<Value>,
}

impl Account {
    /// Pull `name` and `password` out of a backend result object.
    pub fn from_results(results: &serde_json::Map<String, Value>) -> Self {
        Self {
            username: results.get("name").cloned(),
            password: results.get("password").cloned(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The password held between the two halves of a credential change.
#[derive(Clone, PartialEq, Serialize)]
pub struct OldSecret {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Value>,
}

impl fmt::Debug for OldSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OldSecret")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Old and new credentials for a completed change.
#[derive(Clone, PartialEq, Serialize)]
pub struct CredentialChange {
    pub old: Option<OldSecret>,
    pub new: Value,
}

impl fmt::Debug for CredentialChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialChange")
            .field("old", &self.old)
            .field("new", &"[REDACTED]")
            .finish()
    }
}

/// An instruction for the active page.
///
/// Serialized as `{"apply": "<kind>", "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "apply", content = "args", rename_all = "lowercase")]
pub enum PageAction {
    Login(Account),
    Create(Account),
    Change(CredentialChange),
}

impl PageAction {
    pub fn kind(&self) -> &'static str {
        match self {
            PageAction::Login(_) => "login",
            PageAction::Create(_) => "create",
            PageAction::Change(_) => "change",
        }
    }
}

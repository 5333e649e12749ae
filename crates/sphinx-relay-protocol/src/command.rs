//! Backend command names.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every command the backend understands, by its `cmd` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    #[serde(rename = "list")]
    List,
    #[serde(rename = "login")]
    Login,
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "change")]
    Change,
    #[serde(rename = "commit")]
    Commit,
    #[serde(rename = "webauthn-create")]
    WebauthnCreate,
    #[serde(rename = "webauthn-get")]
    WebauthnGet,
}

impl Command {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Login => "login",
            Command::Create => "create",
            Command::Change => "change",
            Command::Commit => "commit",
            Command::WebauthnCreate => "webauthn-create",
            Command::WebauthnGet => "webauthn-get",
        }
    }

    /// Whether this command belongs to a credential ceremony.
    pub fn is_ceremony(self) -> bool {
        matches!(self, Command::WebauthnCreate | Command::WebauthnGet)
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Command::List),
            "login" => Ok(Command::Login),
            "create" => Ok(Command::Create),
            "change" => Ok(Command::Change),
            "commit" => Ok(Command::Commit),
            "webauthn-create" => Ok(Command::WebauthnCreate),
            "webauthn-get" => Ok(Command::WebauthnGet),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of commands the control surface may issue.
///
/// Anything else arriving on the control-surface channel is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    List,
    Login,
    Create,
    Change,
    Commit,
}

impl ControlAction {
    /// The backend command this action maps to when forwarded unchanged.
    pub fn command(self) -> Command {
        match self {
            ControlAction::List => Command::List,
            ControlAction::Login => Command::Login,
            ControlAction::Create => Command::Create,
            ControlAction::Change => Command::Change,
            ControlAction::Commit => Command::Commit,
        }
    }
}

impl FromStr for ControlAction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Command>()? {
            Command::List => Ok(ControlAction::List),
            Command::Login => Ok(ControlAction::Login),
            Command::Create => Ok(ControlAction::Create),
            Command::Change => Ok(ControlAction::Change),
            Command::Commit => Ok(ControlAction::Commit),
            ceremony => Err(ProtocolError::UnknownCommand(ceremony.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_match_serde() {
        let all = [
            Command::List,
            Command::Login,
            Command::Create,
            Command::Change,
            Command::Commit,
            Command::WebauthnCreate,
            Command::WebauthnGet,
        ];

        for command in all {
            let json = serde_json::to_string(&command).unwrap();
            assert_eq!(json, format!("\"{}\"", command.as_str()));
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            "delete".parse::<Command>(),
            Err(ProtocolError::UnknownCommand(name)) if name == "delete"
        ));
    }

    #[test]
    fn test_control_action_rejects_ceremonies() {
        assert_eq!("commit".parse::<ControlAction>().unwrap(), ControlAction::Commit);
        assert!("webauthn-get".parse::<ControlAction>().is_err());
        assert!("undo".parse::<ControlAction>().is_err());
    }

    #[test]
    fn test_is_ceremony() {
        assert!(Command::WebauthnCreate.is_ceremony());
        assert!(!Command::Login.is_ceremony());
    }
}

//! Responses sent from the backend to the relay, and their classification.
//!
//! A response is a flat object whose `results` is either the literal
//! [`FAIL_MARKER`] or a command-specific result object. Classification
//! follows a fixed precedence:
//!
//! 1. explicit failure (`results == "fail"`)
//! 2. manual mode (`results.mode == "manual"`)
//! 3. the command named by `results.cmd`
//! 4. anything else is unhandled
//!
//! Transport errors never reach this module; they are raised by the
//! channel before a response exists.

use crate::actor::MANUAL_MODE;
use crate::command::Command;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Literal `results` value the backend uses to signal a failed command.
pub const FAIL_MARKER: &str = "fail";

/// Numeric identifier of a page context (browser tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl TabId {
    /// Read a tab id from a JSON number or a numeric string.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        id.map(TabId)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Routing class of a backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    /// The backend reported failure and named the failed command.
    Failed { cmd: String },
    /// The backend reported failure without naming a command.
    FailedWithoutCommand,
    /// A manual-mode result, owned entirely by the control surface.
    Manual,
    /// A successful result for a known command.
    Completed(Command),
    /// No routing rule applies.
    Unhandled,
}

/// Classify a backend response.
pub fn classify(response: &Value) -> ResponseKind {
    let Some(results) = response.get("results") else {
        return ResponseKind::Unhandled;
    };

    if results.as_str() == Some(FAIL_MARKER) {
        return match response
            .get("cmd")
            .and_then(Value::as_str)
            .filter(|cmd| !cmd.is_empty())
        {
            Some(cmd) => ResponseKind::Failed {
                cmd: cmd.to_string(),
            },
            None => ResponseKind::FailedWithoutCommand,
        };
    }

    let Some(results) = results.as_object() else {
        return ResponseKind::Unhandled;
    };

    if results.get("mode").and_then(Value::as_str) == Some(MANUAL_MODE) {
        return ResponseKind::Manual;
    }

    results
        .get("cmd")
        .and_then(Value::as_str)
        .and_then(|cmd| cmd.parse::<Command>().ok())
        .map(ResponseKind::Completed)
        .unwrap_or(ResponseKind::Unhandled)
}

/// Replace a failed response's `results` with a structured error echoing the
/// ceremony `id` and the failed `cmd`.
pub fn failure_echo(mut response: Map<String, Value>, cmd: &str) -> Map<String, Value> {
    let mut error = Map::new();
    error.insert("error".to_string(), Value::Bool(true));
    if let Some(id) = response.get("id") {
        error.insert("id".to_string(), id.clone());
    }
    error.insert("cmd".to_string(), json!(cmd));
    response.insert("results".to_string(), Value::Object(error));
    response
}

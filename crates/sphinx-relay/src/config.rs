//! Configuration for the relay.

use crate::error::{RelayError, RelayResult};
use std::path::PathBuf;

/// Default backend executable (the WebSphinx native host).
pub const DEFAULT_BACKEND_PROGRAM: &str = "websphinx";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Relay configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Path of the Unix socket actors connect to
    pub socket_path: PathBuf,

    /// Backend executable spawned as the native-messaging host
    pub backend_program: String,

    /// Extra arguments passed to the backend
    pub backend_args: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Optional JSONL log file
    pub log_path: Option<PathBuf>,
}

impl RelayConfig {
    /// Create a config rooted at `~/.websphinx`, overridden from the
    /// environment.
    pub fn new() -> RelayResult<Self> {
        let base_dir = dirs::home_dir()
            .map(|home| home.join(".websphinx"))
            .ok_or_else(|| RelayError::Config("Home directory not found".to_string()))?;

        let mut config = Self::with_base_dir(base_dir);
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults for a given base directory, without consulting the
    /// environment.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            socket_path: base_dir.join("relay.sock"),
            backend_program: DEFAULT_BACKEND_PROGRAM.to_string(),
            backend_args: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_path: None,
        }
    }

    /// Override values from a variable lookup.
    ///
    /// Recognized: `SPHINX_RELAY_SOCKET`, `SPHINX_BACKEND`,
    /// `SPHINX_RELAY_LOG_LEVEL`, `SPHINX_RELAY_LOG`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(socket) = lookup("SPHINX_RELAY_SOCKET") {
            self.socket_path = PathBuf::from(socket);
        }
        if let Some(program) = lookup("SPHINX_BACKEND") {
            self.backend_program = program;
        }
        if let Some(level) = lookup("SPHINX_RELAY_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(path) = lookup("SPHINX_RELAY_LOG") {
            self.log_path = Some(PathBuf::from(path));
        }
    }
}

//! sphinx-relay binary entry point.
//!
//! Usage: sphinx-relay [--socket <path>] [--backend <program>] [--backend-arg <arg>]...
//!
//! Spawns the backend as a native-messaging child process and listens for
//! actors on a Unix socket.

use clap::Parser;
use sphinx_relay::{
    event_queue, spawn_native_host, Dispatcher, Gateway, Relay, RelayConfig, RelayResult,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Relay between browser actors and the WebSphinx credential backend.
#[derive(Parser, Debug)]
#[command(name = "sphinx-relay")]
#[command(about = "Relay between browser actors and the WebSphinx credential backend")]
struct Args {
    /// Path of the actor socket.
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Backend executable.
    #[arg(long)]
    backend: Option<String>,

    /// Argument passed to the backend (repeatable).
    #[arg(long = "backend-arg")]
    backend_args: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Write JSONL logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut RelayConfig) {
        if let Some(socket) = self.socket {
            config.socket_path = socket;
        }
        if let Some(backend) = self.backend {
            config.backend_program = backend;
        }
        if !self.backend_args.is_empty() {
            config.backend_args = self.backend_args;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(path) = self.log_file {
            config.log_path = Some(path);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> RelayResult<()> {
    let args = Args::parse();

    let mut config = RelayConfig::new()?;
    args.apply(&mut config);

    observability::init_with_config(observability::LogConfig {
        service_name: "sphinx-relay".into(),
        default_level: config.log_level.clone(),
        log_path: config.log_path.clone(),
        also_stderr: true,
        ..Default::default()
    })?;

    info!(
        socket = %config.socket_path.display(),
        backend = %config.backend_program,
        "Configuration loaded"
    );

    let (events_tx, events_rx) = event_queue();

    let (backend, _child) =
        spawn_native_host(&config.backend_program, &config.backend_args, events_tx.clone())?;

    let gateway = Gateway::new(config.socket_path.clone(), events_tx);
    let listener = gateway.bind()?;
    let socket_path = gateway.socket_path().to_path_buf();

    let relay = Relay::new(Dispatcher::new(backend), events_rx);

    let ctrl_c = tokio::signal::ctrl_c();

    let result = tokio::select! {
        result = gateway.serve_listener(listener) => {
            if let Err(e) = &result {
                error!(error = %e, "Gateway exited with error");
            }
            result
        }
        _ = relay.run() => {
            info!("Relay stopped");
            Ok(())
        }
        _ = ctrl_c => {
            info!("Received shutdown signal, exiting...");
            Ok(())
        }
    };

    let _ = std::fs::remove_file(&socket_path);
    result
}

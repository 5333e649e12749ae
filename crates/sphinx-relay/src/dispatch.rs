//! The dispatch engine.
//!
//! Owns every piece of relay state: the backend channel, the actor channel
//! registry, the page table and the change cursor. It is driven one event
//! at a time by [`crate::relay::Relay`] and never awaits, so nothing here
//! needs locking.
//!
//! Inbound, actor messages are normalized into typed backend requests.
//! Outbound, backend responses are classified and routed:
//!
//! | Classification              | Destination                                |
//! |-----------------------------|--------------------------------------------|
//! | transport error             | control surface, `{status: "ERROR"}`       |
//! | `results == "fail"` + `cmd` | page named by `tabId`, error echo          |
//! | `results.mode == "manual"`  | control surface, verbatim                  |
//! | `login`                     | active page, or the change continuation    |
//! | `webauthn-*`                | page named by `results.tabId`, verbatim    |
//! | `list`, `commit`            | control surface, verbatim                  |
//! | `create`                    | active page                                |
//! | `change`                    | active page, with the held old secret      |
//! | anything else               | logged and dropped                         |

use crate::backend::{BackendChannel, BackendEvent};
use crate::bridge::{bridge_request, BridgeOutcome};
use crate::event::RelayEvent;
use crate::normalize::{normalize_content_script, normalize_control_surface};
use crate::pages::PageTable;
use crate::registry::{ActorChannel, ChannelRegistry};
use crate::session::SessionState;
use serde_json::{json, Map, Value};
use sphinx_relay_protocol::{
    classify, failure_echo, Account, BackendRequest, CeremonyMessage, ChangeContinuation, Command,
    ControlAction, ControlSurfaceMessage, CredentialChange, OldSecret, PageAction, ResponseKind,
    TabId, CONTENT_SCRIPT, CONTROL_SURFACE,
};
use tracing::{debug, error, info, warn};

/// Status value of the message sent to the control surface on backend
/// transport failure.
pub const ERROR_STATUS: &str = "ERROR";

/// Single-threaded router between actors and the backend.
#[derive(Debug)]
pub struct Dispatcher {
    backend: BackendChannel,
    channels: ChannelRegistry,
    pages: PageTable,
    session: SessionState,
}

impl Dispatcher {
    pub fn new(backend: BackendChannel) -> Self {
        Self {
            backend,
            channels: ChannelRegistry::new(),
            pages: PageTable::new(),
            session: SessionState::new(),
        }
    }

    pub fn backend(&self) -> &BackendChannel {
        &self.backend
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn pages(&self) -> &PageTable {
        &self.pages
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Whether the backend can still be reached. Once false, stays false.
    pub fn is_available(&self) -> bool {
        self.backend.is_open()
    }

    /// Process one event to completion.
    pub fn handle(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected {
                channel,
                connection_id,
                sender,
            } => {
                let replaced = self
                    .channels
                    .register(ActorChannel::new(channel.clone(), connection_id, sender));
                info!(
                    channel = %channel,
                    connection_id = %connection_id,
                    reconnect = replaced.is_some(),
                    "Actor channel connected"
                );
            }
            RelayEvent::ActorMessage { channel, payload } => {
                self.on_actor_message(&channel, payload);
            }
            RelayEvent::PageOpened {
                tab,
                connection_id,
                sender,
                active,
            } => self.pages.open(tab, connection_id, sender, active),
            RelayEvent::PageFocused { tab } => self.pages.focus(tab),
            RelayEvent::PageClosed { tab, connection_id } => self.pages.close(tab, connection_id),
            RelayEvent::PageRequest { tab, payload } => self.on_page_request(tab, payload),
            RelayEvent::Backend(event) => self.on_backend(event),
        }
    }

    fn on_actor_message(&mut self, channel: &str, payload: Value) {
        match channel {
            CONTROL_SURFACE => self.on_control_surface(payload),
            CONTENT_SCRIPT => self.on_content_script(payload),
            other => debug!(channel = %other, "Message on unrouted channel, dropping"),
        }
    }

    /// Handle a request from the control surface.
    pub fn on_control_surface(&mut self, payload: Value) {
        let message: ControlSurfaceMessage = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Malformed control-surface message, dropping");
                return;
            }
        };

        let action = match message.action.parse::<ControlAction>() {
            Ok(action) => action,
            Err(_) => {
                warn!(action = %message.action, "Unrecognized control-surface action, dropping");
                return;
            }
        };

        debug!(
            action = action.command().as_str(),
            mode = message.mode.as_ref().and_then(serde_json::Value::as_str).unwrap_or(""),
            "Control-surface request"
        );

        match action {
            ControlAction::Login => {
                self.session.clear();
                self.forward(normalize_control_surface(action, &message));
            }
            ControlAction::Change if !message.is_manual() => {
                // Fetch the current secret first; the real change is sent
                // when the login reply comes back.
                self.session.begin_change();
                self.forward(normalize_control_surface(ControlAction::Login, &message));
            }
            _ => self.forward(normalize_control_surface(action, &message)),
        }
    }

    /// Handle a ceremony request from the content-script channel.
    pub fn on_content_script(&mut self, payload: Value) {
        let message: CeremonyMessage = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Malformed content-script message, dropping");
                return;
            }
        };

        if message.action.as_deref().unwrap_or_default().is_empty() {
            warn!("Content-script message without an action, dropping");
            return;
        }

        self.forward(normalize_content_script(&message));
    }

    /// Handle a page-initiated request through the synchronous bridge.
    pub fn on_page_request(&mut self, tab: TabId, payload: Value) {
        let is_webauthn = payload
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| action.starts_with("webauthn"));

        let message: CeremonyMessage = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                if is_webauthn {
                    warn!(tab = %tab, error = %e, "Malformed webauthn page request, dropping");
                }
                return;
            }
        };

        match bridge_request(&message, tab) {
            BridgeOutcome::Ignored => {}
            BridgeOutcome::Unsupported(action) => {
                warn!(tab = %tab, action = %action, "Unsupported webauthn action, dropping");
            }
            BridgeOutcome::Forward(request) => {
                debug!(tab = %tab, cmd = request.cmd(), "Bridging page ceremony");
                self.forward(request);
            }
        }
    }

    /// Handle something from the backend channel.
    pub fn on_backend(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::TransportError { message, fatal } => {
                if fatal {
                    error!(error = %message, "Backend channel broken");
                    self.backend.mark_broken(message.clone());
                } else {
                    warn!(error = %message, "Backend transport error");
                }
                self.report_error(&message);
            }
            BackendEvent::Response(response) => self.route_response(response),
        }
    }

    fn route_response(&mut self, response: Value) {
        match classify(&response) {
            ResponseKind::Failed { cmd } => self.echo_failure(response, &cmd),
            ResponseKind::FailedWithoutCommand => {
                warn!("Backend reported failure without a command, dropping");
            }
            ResponseKind::Manual => {
                debug!("Manual-mode result, passing to control surface");
                self.channels.deliver(CONTROL_SURFACE, response);
            }
            ResponseKind::Completed(command) => self.on_completed(command, response),
            ResponseKind::Unhandled => {
                let cmd = response
                    .get("results")
                    .and_then(|results| results.get("cmd"))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                warn!(cmd = %cmd, "Unhandled backend response");
            }
        }
    }

    fn echo_failure(&mut self, response: Value, cmd: &str) {
        let Value::Object(response) = response else {
            return;
        };

        let Some(tab) = response.get("tabId").and_then(TabId::from_value) else {
            warn!(cmd = %cmd, "Failed command has no usable tab id, dropping");
            return;
        };

        warn!(cmd = %cmd, tab = %tab, "Backend command failed");
        self.pages
            .send_to(tab, Value::Object(failure_echo(response, cmd)));
    }

    fn on_completed(&mut self, command: Command, response: Value) {
        let Some(results) = response.get("results").and_then(Value::as_object).cloned() else {
            return;
        };

        debug!(cmd = command.as_str(), "Routing backend result");

        match command {
            Command::Login if self.session.is_awaiting_old_secret() => {
                self.continue_change(results);
            }
            Command::Login => {
                self.pages
                    .apply_to_active(PageAction::Login(Account::from_results(&results)));
            }
            Command::WebauthnCreate | Command::WebauthnGet => {
                let Some(tab) = results.get("tabId").and_then(TabId::from_value) else {
                    warn!(cmd = command.as_str(), "Ceremony result has no usable tab id, dropping");
                    return;
                };
                self.pages.send_to(tab, response);
            }
            Command::List | Command::Commit => {
                self.channels.deliver(CONTROL_SURFACE, response);
            }
            Command::Create => {
                self.pages
                    .apply_to_active(PageAction::Create(Account::from_results(&results)));
            }
            Command::Change => {
                let old = self.session.complete();
                self.pages.apply_to_active(PageAction::Change(CredentialChange {
                    old,
                    new: Value::Object(results),
                }));
            }
        }
    }

    /// Second half of an automatic change: hold the old password and send
    /// the login result back as a `change` request.
    fn continue_change(&mut self, results: Map<String, Value>) {
        let (continuation, password) = ChangeContinuation::from_login_result(results);
        self.session.capture(OldSecret { password });
        debug!("Old secret captured, sending change");
        self.forward(BackendRequest::ChangeContinuation(continuation));
    }

    fn forward(&mut self, request: BackendRequest) {
        match self.backend.send(&request) {
            Ok(()) => debug!(cmd = request.cmd(), "Request sent to backend"),
            Err(e) => {
                warn!(cmd = request.cmd(), error = %e, "Request not sent");
                self.report_error(&e.to_string());
            }
        }
    }

    fn report_error(&self, message: &str) {
        self.channels.deliver(
            CONTROL_SURFACE,
            json!({"status": ERROR_STATUS, "error": message}),
        );
    }
}

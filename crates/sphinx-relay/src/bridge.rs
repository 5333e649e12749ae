//! Synchronous bridge for page-initiated webauthn ceremonies.
//!
//! A page context calls the credential API and expects an answer as if the
//! call were synchronous. The bridge forwards the ceremony with the sender's
//! tab id attached; the reply comes back through normal response routing,
//! which uses that tab id to find the page again.

use sphinx_relay_protocol::{
    BackendRequest, CeremonyMessage, Command, TabId, WebauthnFields, WebauthnRequest,
};

/// What the bridge decided to do with a page request.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeOutcome {
    /// Not a webauthn request; some other listener owns it.
    Ignored,
    /// A `webauthn*` action this relay has no ceremony for.
    Unsupported(String),
    /// Send this to the backend.
    Forward(BackendRequest),
}

/// Build the backend request for a page-initiated ceremony.
///
/// `tab` comes from the connection that sent the message, never from the
/// payload.
pub fn bridge_request(message: &CeremonyMessage, tab: TabId) -> BridgeOutcome {
    if !message.is_webauthn() {
        return BridgeOutcome::Ignored;
    }

    let action = message.action.as_deref().unwrap_or_default();
    let params = message.params();
    let fields = WebauthnFields {
        mode: message.mode.clone(),
        site: message.site.clone(),
        client_data_json: params.client_data_json,
        challenge: params.challenge,
        name: params.username,
        userid: params.userid,
        id: message.id.clone(),
    };

    match action.parse::<Command>() {
        Ok(Command::WebauthnCreate) => {
            BridgeOutcome::Forward(BackendRequest::Webauthn(WebauthnRequest::create(fields, tab)))
        }
        Ok(Command::WebauthnGet) => BridgeOutcome::Forward(BackendRequest::Webauthn(
            WebauthnRequest::get(fields, params.pk, tab),
        )),
        _ => BridgeOutcome::Unsupported(action.to_string()),
    }
}

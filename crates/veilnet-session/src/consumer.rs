//! Session establishment from the consumer side

use crate::wire::{
    SessionConfig, SessionCreateRequest, SessionCreateResponse, SessionId,
    ENDPOINT_SESSION_CREATE,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use veilnet_comm::{Dialog, DialogError, DialogFactory};
use veilnet_discovery::ServiceProposal;
use veilnet_identity::Identity;

/// Session negotiation errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("proposal names no provider contacts")]
    MissingContact,

    #[error(transparent)]
    Dialog(#[from] DialogError),

    #[error("session create failed: {0}")]
    Create(String),
}

/// Open a dialog to the proposal's provider and negotiate a session.
///
/// The first contact in the proposal is used. On a failed negotiation the
/// dialog is closed before the error is returned; on success ownership of
/// the dialog passes to the caller, who is responsible for closing it.
pub async fn open_session(
    dialog_factory: &dyn DialogFactory,
    consumer_id: &Identity,
    proposal: &ServiceProposal,
) -> Result<(Arc<dyn Dialog>, SessionId, SessionConfig), SessionError> {
    let contact = proposal
        .provider_contacts
        .first()
        .ok_or(SessionError::MissingContact)?;

    let dialog = dialog_factory
        .create(consumer_id, &proposal.provider_id, contact)
        .await?;

    match request_session(dialog.as_ref(), proposal).await {
        Ok((session_id, session_config)) => {
            debug!(session_id = %session_id, provider = %proposal.provider_id, "session established");
            Ok((dialog, session_id, session_config))
        }
        Err(err) => {
            if let Err(close_err) = dialog.close().await {
                warn!("failed to close dialog after session create failure: {close_err}");
            }
            Err(err)
        }
    }
}

/// Run the session-create exchange over an established dialog.
pub async fn request_session(
    dialog: &dyn Dialog,
    proposal: &ServiceProposal,
) -> Result<(SessionId, SessionConfig), SessionError> {
    let request = SessionCreateRequest {
        proposal_id: proposal.id,
    };
    let payload =
        serde_json::to_value(&request).map_err(|err| SessionError::Create(err.to_string()))?;

    let reply = dialog
        .request(ENDPOINT_SESSION_CREATE, payload)
        .await
        .map_err(|err| SessionError::Create(err.to_string()))?;

    let response: SessionCreateResponse =
        serde_json::from_value(reply).map_err(|err| SessionError::Create(err.to_string()))?;

    if !response.success {
        return Err(SessionError::Create(if response.message.is_empty() {
            "provider refused session".to_string()
        } else {
            response.message
        }));
    }

    let session = response
        .session
        .ok_or_else(|| SessionError::Create("provider reply carries no session".to_string()))?;

    Ok((session.id, session.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use veilnet_discovery::Contact;

    struct ScriptedDialog {
        reply: Result<Value, String>,
        closed: Mutex<bool>,
    }

    impl ScriptedDialog {
        fn replying(reply: Value) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                closed: Mutex::new(false),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                closed: Mutex::new(false),
            })
        }

        fn closed(&self) -> bool {
            *self.closed.lock().unwrap()
        }
    }

    #[async_trait]
    impl Dialog for ScriptedDialog {
        async fn request(&self, endpoint: &str, _payload: Value) -> Result<Value, DialogError> {
            assert_eq!(endpoint, ENDPOINT_SESSION_CREATE);
            self.reply
                .clone()
                .map_err(DialogError::RequestFailed)
        }

        fn peer_id(&self) -> Identity {
            Identity::from_address("provider-1")
        }

        async fn close(&self) -> Result<(), DialogError> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    struct FixedFactory {
        dialog: Arc<ScriptedDialog>,
    }

    #[async_trait]
    impl DialogFactory for FixedFactory {
        async fn create(
            &self,
            _consumer_id: &Identity,
            _provider_id: &Identity,
            _contact: &Contact,
        ) -> Result<Arc<dyn Dialog>, DialogError> {
            Ok(self.dialog.clone())
        }
    }

    fn proposal_with_contact() -> ServiceProposal {
        ServiceProposal {
            id: 7,
            provider_id: Identity::from_address("provider-1"),
            provider_contacts: vec![Contact::default()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_session_returns_id_and_config() {
        let dialog = ScriptedDialog::replying(json!({
            "success": true,
            "session": {"id": "session-100", "config": {"remote": "10.0.0.1"}}
        }));
        let factory = FixedFactory {
            dialog: dialog.clone(),
        };

        let (_dialog, session_id, config) = open_session(
            &factory,
            &Identity::from_address("consumer-1"),
            &proposal_with_contact(),
        )
        .await
        .unwrap();

        assert_eq!(session_id, SessionId::new("session-100"));
        assert_eq!(config["remote"], json!("10.0.0.1"));
        assert!(!dialog.closed());
    }

    #[tokio::test]
    async fn test_open_session_rejects_contactless_proposal() {
        let dialog = ScriptedDialog::replying(json!({"success": true}));
        let factory = FixedFactory { dialog };
        let proposal = ServiceProposal::default();

        let err = match open_session(&factory, &Identity::from_address("consumer-1"), &proposal)
            .await
        {
            Err(e) => e,
            Ok(_) => panic!("expected open_session to fail"),
        };
        assert!(matches!(err, SessionError::MissingContact));
    }

    #[tokio::test]
    async fn test_open_session_closes_dialog_on_refusal() {
        let dialog = ScriptedDialog::replying(json!({"success": false, "message": "no capacity"}));
        let factory = FixedFactory {
            dialog: dialog.clone(),
        };

        let err = match open_session(
            &factory,
            &Identity::from_address("consumer-1"),
            &proposal_with_contact(),
        )
        .await
        {
            Err(e) => e,
            Ok(_) => panic!("expected open_session to fail"),
        };

        assert!(matches!(err, SessionError::Create(message) if message == "no capacity"));
        assert!(dialog.closed());
    }

    #[tokio::test]
    async fn test_open_session_closes_dialog_on_transport_failure() {
        let dialog = ScriptedDialog::failing("broker gone");
        let factory = FixedFactory {
            dialog: dialog.clone(),
        };

        let err = match open_session(
            &factory,
            &Identity::from_address("consumer-1"),
            &proposal_with_contact(),
        )
        .await
        {
            Err(e) => e,
            Ok(_) => panic!("expected open_session to fail"),
        };

        assert!(matches!(err, SessionError::Create(_)));
        assert!(dialog.closed());
    }
}

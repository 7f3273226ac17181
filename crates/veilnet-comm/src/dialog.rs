//! Dialog and dialog factory traits

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use veilnet_discovery::Contact;
use veilnet_identity::Identity;

/// Dialog transport errors
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("dialog could not be established: {0}")]
    EstablishFailed(String),

    #[error("unsupported contact type: {0}")]
    UnsupportedContact(String),

    #[error("dialog request failed: {0}")]
    RequestFailed(String),

    #[error("dialog is closed")]
    Closed,
}

/// Consumer half of an established dialog.
///
/// Requests are JSON payloads addressed to a named endpoint on the remote
/// peer. `close` is idempotent; requests after `close` fail with
/// [`DialogError::Closed`].
#[async_trait]
pub trait Dialog: Send + Sync {
    async fn request(&self, endpoint: &str, payload: Value) -> Result<Value, DialogError>;

    /// Identity of the remote peer the dialog is bound to.
    fn peer_id(&self) -> Identity;

    async fn close(&self) -> Result<(), DialogError>;
}

/// Establishes dialogs on behalf of a consumer identity.
///
/// Implementations close over whatever credentials the broker requires; the
/// connection core never sees them.
#[async_trait]
pub trait DialogFactory: Send + Sync {
    async fn create(
        &self,
        consumer_id: &Identity,
        provider_id: &Identity,
        contact: &Contact,
    ) -> Result<Arc<dyn Dialog>, DialogError>;
}

//! Session negotiation wire types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dialog endpoint serving session creation on the provider side.
pub const ENDPOINT_SESSION_CREATE: &str = "session-create";

/// Provider-assigned session identifier, unique per dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque tunnel configuration returned with the session id. Only the
/// connection factory selected by the proposal's service type interprets it.
pub type SessionConfig = serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateRequest {
    pub proposal_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub success: bool,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub session: Option<SessionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDto {
    pub id: SessionId,

    #[serde(default)]
    pub config: SessionConfig,
}

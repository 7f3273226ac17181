//! Consumer-side session negotiation
//!
//! After discovery hands back a proposal, the consumer opens a dialog to the
//! provider and asks it to create a session. The provider answers with a
//! session id and an opaque configuration blob that only the matching tunnel
//! client knows how to consume.

mod consumer;
mod wire;

pub use consumer::{open_session, request_session, SessionError};
pub use wire::{
    SessionConfig, SessionCreateRequest, SessionCreateResponse, SessionDto, SessionId,
    ENDPOINT_SESSION_CREATE,
};

//! Micropayment promise issuing hooks

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use veilnet_comm::Dialog;
use veilnet_discovery::ServiceProposal;
use veilnet_identity::Identity;

/// Promise issuer errors
#[derive(Debug, Error)]
#[error("promise issuer failed: {0}")]
pub struct PromiseError(pub String);

/// Issues payment commitments to the provider for the duration of a session.
///
/// `start` and `stop` are each invoked exactly once per session, bracketing
/// the connected window; `stop` runs on every exit path once `start` has
/// succeeded.
#[async_trait]
pub trait PromiseIssuer: Send + Sync {
    async fn start(&self, proposal: &ServiceProposal) -> Result<(), PromiseError>;

    async fn stop(&self) -> Result<(), PromiseError>;
}

/// Builds a promise issuer bound to the paying identity and the session
/// dialog.
pub type PromiseIssuerFactory =
    Box<dyn Fn(&Identity, Arc<dyn Dialog>) -> Box<dyn PromiseIssuer> + Send + Sync>;

/// Issuer for configurations with micropayments disabled.
pub struct NoopPromiseIssuer;

#[async_trait]
impl PromiseIssuer for NoopPromiseIssuer {
    async fn start(&self, proposal: &ServiceProposal) -> Result<(), PromiseError> {
        debug!(provider = %proposal.provider_id, "promise issuing disabled, nothing to start");
        Ok(())
    }

    async fn stop(&self) -> Result<(), PromiseError> {
        debug!("promise issuing disabled, nothing to stop");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_issuer_accepts_any_session() {
        let issuer = NoopPromiseIssuer;
        issuer.start(&ServiceProposal::default()).await.unwrap();
        issuer.stop().await.unwrap();
    }
}

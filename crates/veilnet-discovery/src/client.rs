//! Discovery directory client interface

use crate::ServiceProposal;
use async_trait::async_trait;
use thiserror::Error;
use veilnet_identity::{Identity, Signer};

/// Directory client errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(String),

    #[error("directory rejected request: {0}")]
    Rejected(String),
}

/// Client of the discovery directory holding published service proposals.
///
/// `find_proposals` is the only call the connection core makes; registration
/// belongs to the provider side and is signed by the publishing identity.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn find_proposals(
        &self,
        provider_id: &Identity,
    ) -> Result<Vec<ServiceProposal>, DirectoryError>;

    async fn register_proposal(
        &self,
        proposal: &ServiceProposal,
        signer: &dyn Signer,
    ) -> Result<(), DirectoryError>;

    async fn unregister_proposal(
        &self,
        proposal: &ServiceProposal,
        signer: &dyn Signer,
    ) -> Result<(), DirectoryError>;
}

//! Signer handles
//!
//! The keystore lives outside the connection core; components that need
//! signatures receive a [`Signer`] (or a [`SignerFactory`] when the identity
//! is chosen at call time) and never see key material.

use crate::Identity;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Signing errors
#[derive(Debug, Error)]
pub enum SignError {
    #[error("identity is not unlocked")]
    Locked,

    #[error("signing failed: {0}")]
    Failed(String),
}

/// A detached signature over a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Signature {
    /// Lowercase hex, the form used in wire credentials.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Opaque signing handle bound to one identity.
pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Signature, SignError>;
}

/// Produces a signer for a given identity, deferring keystore access until
/// the identity is known.
pub type SignerFactory = Arc<dyn Fn(&Identity) -> Arc<dyn Signer> + Send + Sync>;

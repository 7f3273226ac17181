//! Identity addresses and signer handles for veilnet nodes
//!
//! An [`Identity`] is the opaque hex address a node is known by on the
//! network. Signing is abstracted behind the [`Signer`] trait so the
//! keystore implementation stays outside the connection core.

mod identity;
mod signer;

pub use identity::Identity;
pub use signer::{SignError, Signature, Signer, SignerFactory};

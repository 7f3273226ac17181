//! Tunnel client interface

use crate::manager::ConnectOptions;
use crate::state::StateSender;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Tunnel client errors
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("invalid session config: {0}")]
    Config(String),

    #[error("tunnel process failed: {0}")]
    Process(#[from] std::io::Error),

    #[error("tunnel client failed: {0}")]
    Client(String),
}

/// A running (or startable) tunnel client.
///
/// `start` returns once the underlying process is live; the eventual
/// `Connected` token arrives later on the state channel the client was
/// created with. `stop` asks the client to shut down; the process exit is
/// again reported through the state channel.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn start(&self) -> Result<(), TunnelError>;

    async fn stop(&self) -> Result<(), TunnelError>;
}

/// Builds a tunnel client for one negotiated session.
///
/// The factory keeps creation cheap and synchronous; all process work happens
/// in [`Connection::start`]. Lifecycle tokens are emitted on `state_tx` from
/// `start` until process exit.
pub trait ConnectionFactory: Send + Sync {
    fn create(
        &self,
        options: ConnectOptions,
        state_tx: StateSender,
    ) -> Result<Arc<dyn Connection>, TunnelError>;
}

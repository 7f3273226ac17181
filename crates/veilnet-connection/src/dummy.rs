//! Dummy tunnel client
//!
//! Used by configurations that exercise the session machinery without a real
//! tunnel: `start` replays the canonical success sequence synchronously and
//! `stop` the exit sequence.

use crate::connection::{Connection, ConnectionFactory, TunnelError};
use crate::manager::ConnectOptions;
use crate::state::{StateSender, TunnelState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Service type tag the dummy factory registers under.
pub const SERVICE_TYPE_DUMMY: &str = "dummy";

pub struct DummyConnection {
    state_tx: StateSender,
}

#[async_trait]
impl Connection for DummyConnection {
    async fn start(&self) -> Result<(), TunnelError> {
        debug!("dummy tunnel starting");
        for state in [
            TunnelState::ProcessStarted,
            TunnelState::Connecting,
            TunnelState::Wait,
            TunnelState::Authenticating,
            TunnelState::GetConfig,
            TunnelState::AssignIp,
            TunnelState::Connected,
        ] {
            let _ = self.state_tx.send(state);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), TunnelError> {
        debug!("dummy tunnel stopping");
        for state in [TunnelState::Exiting, TunnelState::ProcessExited] {
            let _ = self.state_tx.send(state);
        }
        Ok(())
    }
}

pub struct DummyConnectionFactory;

impl ConnectionFactory for DummyConnectionFactory {
    fn create(
        &self,
        _options: ConnectOptions,
        state_tx: StateSender,
    ) -> Result<Arc<dyn Connection>, TunnelError> {
        Ok(Arc::new(DummyConnection { state_tx }))
    }
}

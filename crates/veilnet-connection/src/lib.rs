//! Tunnel connection management
//!
//! The [`ConnectionManager`] brokers a consumer's request to join a
//! provider's tunnel: it resolves the provider's service proposal, negotiates
//! a session over a broker dialog, starts the tunnel client produced by the
//! matching [`ConnectionFactory`], and tracks the session until teardown.
//! Tunnel clients report lifecycle state as a channel of [`TunnelState`]
//! tokens consumed by the [`StatePump`].
//!
//! At most one session exists at a time. `connect` can be cancelled by a
//! concurrent `disconnect`; partial progress is unwound at whichever step the
//! cancellation is observed.

mod connection;
mod dummy;
mod error;
mod manager;
mod promise;
mod pump;
mod registry;
mod state;
mod stats;
mod status;

pub use connection::{Connection, ConnectionFactory, TunnelError};
pub use dummy::{DummyConnection, DummyConnectionFactory, SERVICE_TYPE_DUMMY};
pub use error::ConnectionError;
pub use manager::{ConnectOptions, ConnectParams, ConnectionManager};
pub use promise::{NoopPromiseIssuer, PromiseError, PromiseIssuer, PromiseIssuerFactory};
pub use pump::{PumpPhase, StateObserver, StatePump, StateSink};
pub use registry::ConnectionRegistry;
pub use state::{StateReceiver, StateSender, TunnelState};
pub use stats::{SessionStats, SessionStatsKeeper, StatsTracker};
pub use status::ConnectionStatus;

//! Tunnel lifecycle state tokens

use tokio::sync::mpsc;

/// Lifecycle signal emitted by a tunnel client.
///
/// The manager reacts to a small closed set of tokens; anything else arrives
/// as [`TunnelState::Other`] and is forwarded to observers without affecting
/// the session status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelState {
    ProcessStarted,
    Connecting,
    Wait,
    Authenticating,
    GetConfig,
    AssignIp,
    Connected,
    Reconnecting,
    Exiting,
    ProcessExited,
    /// Token outside the recognized set, carried verbatim.
    Other(String),
}

/// Producer half of a tunnel's state channel, handed to the connection
/// factory. Senders are cheap to clone; the channel closes once every sender
/// is dropped.
pub type StateSender = mpsc::UnboundedSender<TunnelState>;

/// Consumer half of a tunnel's state channel, owned by the state pump.
pub type StateReceiver = mpsc::UnboundedReceiver<TunnelState>;

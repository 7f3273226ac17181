//! State pump
//!
//! One pump task runs per session. It drains the tunnel's state channel,
//! forwards every token to the statistics observer, applies the token to the
//! manager through the [`StateSink`], and surfaces the two phases the
//! in-flight `connect` waits on. The pump holds no reference to the manager
//! itself, only to its sink; the manager owns the pump's join handle.

use crate::state::{StateReceiver, TunnelState};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Terminal-relevant phases of a pump, published for the connect waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpPhase {
    Running,
    /// A `Connected` token was observed.
    Connected,
    /// The process exited or the state channel closed.
    Exited,
}

/// Receives classified tunnel states from the pump.
#[async_trait]
pub trait StateSink: Send + Sync {
    /// Called for every token, in channel order.
    fn state_changed(&self, state: &TunnelState);

    /// Called exactly once, after the last token.
    async fn pump_finished(&self);
}

/// Out-of-band observer invoked with every raw token, e.g. a statistics
/// sender. Must not block.
pub type StateObserver = Arc<dyn Fn(&TunnelState) + Send + Sync>;

/// Drains one session's state channel until the process exits.
pub struct StatePump {
    states: StateReceiver,
    sink: Arc<dyn StateSink>,
    observer: StateObserver,
    phase_tx: watch::Sender<PumpPhase>,
}

impl StatePump {
    pub fn new(
        states: StateReceiver,
        sink: Arc<dyn StateSink>,
        observer: StateObserver,
        phase_tx: watch::Sender<PumpPhase>,
    ) -> Self {
        Self {
            states,
            sink,
            observer,
            phase_tx,
        }
    }

    pub async fn run(mut self) {
        while let Some(state) = self.states.recv().await {
            (self.observer)(&state);
            self.sink.state_changed(&state);

            match state {
                TunnelState::Connected => {
                    let _ = self.phase_tx.send(PumpPhase::Connected);
                }
                TunnelState::ProcessExited => break,
                _ => {}
            }
        }

        let _ = self.phase_tx.send(PumpPhase::Exited);
        self.sink.pump_finished().await;
        debug!("state pump finished");
    }
}

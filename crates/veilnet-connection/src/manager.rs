//! Connection manager
//!
//! Orchestrates the session lifecycle: proposal lookup, dialog and session
//! negotiation, promise issuing, tunnel client start, and teardown. At most
//! one session exists at a time; the slot mutex guards the status and the
//! owned resources and is never held across an await. Long operations run
//! with the mutex released, with the status acting as the synchronization
//! sentinel between concurrent `connect`/`disconnect` callers.

use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::promise::{PromiseIssuer, PromiseIssuerFactory};
use crate::pump::{PumpPhase, StateObserver, StatePump, StateSink};
use crate::registry::ConnectionRegistry;
use crate::state::TunnelState;
use crate::stats::SessionStatsKeeper;
use crate::status::ConnectionStatus;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use veilnet_comm::{Dialog, DialogFactory};
use veilnet_discovery::{DirectoryClient, ServiceProposal};
use veilnet_identity::Identity;
use veilnet_session::{open_session, SessionConfig, SessionId};

/// Bound on waiting for the tunnel process to exit during teardown.
const PUMP_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller-supplied knobs for one `connect` invocation.
#[derive(Debug, Clone, Default)]
pub struct ConnectParams {
    /// Restrict the proposal lookup to one service type.
    pub service_type: Option<String>,
}

/// Everything a connection factory needs to build the tunnel client for one
/// negotiated session.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub consumer_id: Identity,
    pub provider_id: Identity,
    pub proposal: ServiceProposal,
    pub session_id: SessionId,
    /// Opaque provider-supplied tunnel configuration; interpreted only by
    /// the factory.
    pub session_config: SessionConfig,
}

/// Handle onto an in-flight `connect`, kept in the slot so a concurrent
/// `disconnect` can cancel it and wait for its rollback to finish.
#[derive(Clone)]
struct ConnectHandle {
    cancel_tx: mpsc::Sender<()>,
    done_rx: watch::Receiver<bool>,
}

/// Resources owned by an established session, released on teardown.
struct ActiveSession {
    session_id: SessionId,
    dialog: Arc<dyn Dialog>,
    connection: Arc<dyn Connection>,
    issuer: Box<dyn PromiseIssuer>,
    pump: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    status: ConnectionStatus,
    connecting: Option<ConnectHandle>,
    active: Option<ActiveSession>,
}

/// Manages the single tunnel session of this node.
///
/// Cheap to clone; clones share the same session slot.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    directory: Arc<dyn DirectoryClient>,
    dialog_factory: Arc<dyn DialogFactory>,
    issuer_factory: PromiseIssuerFactory,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<dyn SessionStatsKeeper>,
    observer: StateObserver,
    slot: Mutex<Slot>,
}

impl ConnectionManager {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        dialog_factory: Arc<dyn DialogFactory>,
        issuer_factory: PromiseIssuerFactory,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<dyn SessionStatsKeeper>,
        observer: StateObserver,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                directory,
                dialog_factory,
                issuer_factory,
                registry,
                stats,
                observer,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    /// Snapshot of the current status.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.lock_slot().status.clone()
    }

    /// Establish a session with `provider_id`, blocking until the tunnel
    /// reports connected or the attempt fails.
    ///
    /// Fails with [`ConnectionError::AlreadyExists`] while any session (or
    /// attempt) exists. A concurrent [`disconnect`](Self::disconnect) cancels
    /// the attempt, which then returns
    /// [`ConnectionError::ConnectionCancelled`].
    pub async fn connect(
        &self,
        consumer_id: Identity,
        provider_id: Identity,
        params: ConnectParams,
    ) -> Result<(), ConnectionError> {
        let (cancel_tx, mut cancel_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = watch::channel(false);

        {
            let mut slot = self.inner.lock_slot();
            if slot.status != ConnectionStatus::NotConnected {
                return Err(ConnectionError::AlreadyExists);
            }
            slot.status = ConnectionStatus::Connecting;
            slot.connecting = Some(ConnectHandle { cancel_tx, done_rx });
        }
        debug!(provider = %provider_id, "connecting");

        let result = self
            .inner
            .run_connect(&consumer_id, &provider_id, params, &mut cancel_rx)
            .await;

        {
            let mut slot = self.inner.lock_slot();
            slot.connecting = None;
            if result.is_err() {
                slot.status = ConnectionStatus::NotConnected;
            }
        }
        let _ = done_tx.send(true);

        match &result {
            Ok(()) => info!(provider = %provider_id, "connected"),
            Err(err) => warn!(provider = %provider_id, "connect failed: {err}"),
        }
        result
    }

    /// Tear the current session down, blocking until the slot is released.
    ///
    /// A `connect` in flight is cancelled instead. Fails with
    /// [`ConnectionError::NoConnection`] when there is nothing to tear down.
    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        enum Pending {
            Cancel(ConnectHandle),
            Teardown(Box<ActiveSession>),
        }

        let mut cancelled_connect = false;
        loop {
            let pending = {
                let mut slot = self.inner.lock_slot();
                let status = slot.status.clone();
                match status {
                    ConnectionStatus::NotConnected | ConnectionStatus::Disconnecting => {
                        return if cancelled_connect {
                            Ok(())
                        } else {
                            Err(ConnectionError::NoConnection)
                        };
                    }
                    ConnectionStatus::Connecting => match slot.connecting.clone() {
                        Some(handle) => Pending::Cancel(handle),
                        // Connect observed the cancel but has not cleared the
                        // status yet; treat as gone.
                        None => return Err(ConnectionError::NoConnection),
                    },
                    ConnectionStatus::Connected { .. } | ConnectionStatus::Reconnecting => {
                        match slot.active.take() {
                            Some(session) => {
                                slot.status = ConnectionStatus::Disconnecting;
                                Pending::Teardown(Box::new(session))
                            }
                            // The pump is finalizing an unsolicited process
                            // exit; the session is already gone.
                            None => return Err(ConnectionError::NoConnection),
                        }
                    }
                }
            };

            match pending {
                Pending::Cancel(handle) => {
                    debug!("cancelling connect in progress");
                    let _ = handle.cancel_tx.try_send(());
                    let mut done_rx = handle.done_rx;
                    while !*done_rx.borrow_and_update() {
                        if done_rx.changed().await.is_err() {
                            break;
                        }
                    }
                    // Re-examine the slot: the connect may have completed
                    // before it saw the cancel signal.
                    cancelled_connect = true;
                }
                Pending::Teardown(session) => {
                    self.inner.teardown(*session).await;
                    info!("disconnected");
                    return Ok(());
                }
            }
        }
    }
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The connect ladder, steps 2-9. The caller has already moved the slot
    /// to `Connecting` and resets it on any error returned from here; each
    /// step below unwinds the resources acquired before it on failure or
    /// cancellation.
    async fn run_connect(
        self: &Arc<Self>,
        consumer_id: &Identity,
        provider_id: &Identity,
        params: ConnectParams,
        cancel: &mut mpsc::Receiver<()>,
    ) -> Result<(), ConnectionError> {
        let proposal = with_cancel(
            cancel,
            self.find_proposal(provider_id, params.service_type.as_deref()),
        )
        .await?;

        // Dialog acquisition runs to completion once entered: aborting it
        // mid-flight would drop an already-created dialog without closing
        // it. The cancel signal is honored at the step boundaries instead.
        let (dialog, session_id, session_config) =
            open_session(self.dialog_factory.as_ref(), consumer_id, &proposal)
                .await
                .map_err(ConnectionError::from)?;
        if cancel_requested(cancel) {
            self.close_dialog(dialog.as_ref()).await;
            return Err(ConnectionError::ConnectionCancelled);
        }

        let issuer = (self.issuer_factory)(consumer_id, dialog.clone());
        if let Err(err) = issuer.start(&proposal).await {
            self.close_dialog(dialog.as_ref()).await;
            return Err(ConnectionError::ConnectionFailed(err.to_string()));
        }
        if cancel_requested(cancel) {
            self.stop_issuer(issuer.as_ref()).await;
            self.close_dialog(dialog.as_ref()).await;
            return Err(ConnectionError::ConnectionCancelled);
        }

        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let options = ConnectOptions {
            consumer_id: consumer_id.clone(),
            provider_id: provider_id.clone(),
            proposal,
            session_id: session_id.clone(),
            session_config,
        };
        let connection = match self.registry.create_connection(options, state_tx) {
            Ok(connection) => connection,
            Err(err) => {
                self.stop_issuer(issuer.as_ref()).await;
                self.close_dialog(dialog.as_ref()).await;
                return Err(err);
            }
        };

        let (phase_tx, mut phase_rx) = watch::channel(PumpPhase::Running);
        let sink: Arc<dyn StateSink> = self.clone();
        let pump = StatePump::new(state_rx, sink, self.observer.clone(), phase_tx);
        let pump_handle = tokio::spawn(pump.run());

        // Same boundary rule as the dialog: once the tunnel process spawn
        // is underway, let it finish so a live process is never abandoned
        // without a stop.
        if let Err(err) = connection.start().await {
            pump_handle.abort();
            self.stop_issuer(issuer.as_ref()).await;
            self.close_dialog(dialog.as_ref()).await;
            return Err(ConnectionError::ConnectionFailed(err.to_string()));
        }
        if cancel_requested(cancel) {
            pump_handle.abort();
            self.stop_connection(connection.as_ref()).await;
            self.stop_issuer(issuer.as_ref()).await;
            self.close_dialog(dialog.as_ref()).await;
            return Err(ConnectionError::ConnectionCancelled);
        }

        // Wait for the tunnel to come up. Intermediate tokens keep the
        // status at `Connecting`; only a `Connected` token, a process exit,
        // or a cancellation ends the wait.
        let wait_result = loop {
            match *phase_rx.borrow_and_update() {
                PumpPhase::Connected => break Ok(()),
                PumpPhase::Exited => {
                    break Err(ConnectionError::ConnectionFailed(
                        "tunnel process exited during connect".to_string(),
                    ))
                }
                PumpPhase::Running => {}
            }
            tokio::select! {
                biased;
                _ = cancel.recv() => break Err(ConnectionError::ConnectionCancelled),
                changed = phase_rx.changed() => {
                    if changed.is_err() {
                        break Err(ConnectionError::ConnectionFailed(
                            "state pump stopped unexpectedly".to_string(),
                        ));
                    }
                }
            }
        };

        if let Err(err) = wait_result {
            pump_handle.abort();
            self.stop_connection(connection.as_ref()).await;
            self.stop_issuer(issuer.as_ref()).await;
            self.close_dialog(dialog.as_ref()).await;
            return Err(err);
        }

        self.stats.mark_session_start();
        let mut slot = self.lock_slot();
        slot.status = ConnectionStatus::Connected {
            session_id: session_id.clone(),
        };
        slot.active = Some(ActiveSession {
            session_id,
            dialog,
            connection,
            issuer,
            pump: pump_handle,
        });
        Ok(())
    }

    /// Resolve the provider's proposal through the discovery directory,
    /// optionally narrowed to one service type. A directory outage reads
    /// the same as an empty result; the cause is logged here.
    async fn find_proposal(
        &self,
        provider_id: &Identity,
        service_type: Option<&str>,
    ) -> Result<ServiceProposal, ConnectionError> {
        let proposals = match self.directory.find_proposals(provider_id).await {
            Ok(proposals) => proposals,
            Err(err) => {
                warn!(provider = %provider_id, "proposal lookup failed: {err}");
                return Err(ConnectionError::NoProposals);
            }
        };
        proposals
            .into_iter()
            .find(|proposal| {
                service_type
                    .map(|wanted| proposal.service_type == wanted)
                    .unwrap_or(true)
            })
            .ok_or(ConnectionError::NoProposals)
    }

    /// Release an established session: stop the tunnel client, wait (bounded)
    /// for the process to exit, then unwind the remaining resources.
    async fn teardown(&self, session: ActiveSession) {
        self.stop_connection(session.connection.as_ref()).await;

        let mut pump = session.pump;
        match tokio::time::timeout(PUMP_STOP_TIMEOUT, &mut pump).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("state pump task failed: {err}"),
            Err(_) => {
                warn!("timed out waiting for tunnel process exit");
                pump.abort();
            }
        }

        self.stop_issuer(session.issuer.as_ref()).await;
        self.close_dialog(session.dialog.as_ref()).await;
        self.stats.mark_session_end();

        let mut slot = self.lock_slot();
        slot.status = ConnectionStatus::NotConnected;
    }

    async fn stop_connection(&self, connection: &dyn Connection) {
        if let Err(err) = connection.stop().await {
            warn!("failed to stop tunnel client: {err}");
        }
    }

    async fn stop_issuer(&self, issuer: &dyn PromiseIssuer) {
        if let Err(err) = issuer.stop().await {
            warn!("failed to stop promise issuer: {err}");
        }
    }

    async fn close_dialog(&self, dialog: &dyn Dialog) {
        if let Err(err) = dialog.close().await {
            warn!("failed to close provider dialog: {err}");
        }
    }
}

#[async_trait]
impl StateSink for Inner {
    fn state_changed(&self, state: &TunnelState) {
        let mut slot = self.lock_slot();
        // While a connect is still in flight nothing is installed yet;
        // intermediate tokens are observability-only.
        let Some(session) = slot.active.as_ref() else {
            return;
        };
        let session_id = session.session_id.clone();

        match state {
            TunnelState::Connected => {
                if slot.status == ConnectionStatus::Reconnecting {
                    slot.status = ConnectionStatus::Connected { session_id };
                }
            }
            TunnelState::Reconnecting => slot.status = ConnectionStatus::Reconnecting,
            TunnelState::Exiting => slot.status = ConnectionStatus::Disconnecting,
            _ => {}
        }
    }

    async fn pump_finished(&self) {
        // An explicit disconnect takes the session out of the slot before
        // waiting on the pump; in that case there is nothing left to do here.
        let finished = self.lock_slot().active.take();
        let Some(session) = finished else {
            return;
        };

        info!(session_id = %session.session_id, "tunnel process exited, releasing session");
        self.stats.mark_session_end();
        self.stop_issuer(session.issuer.as_ref()).await;
        self.close_dialog(session.dialog.as_ref()).await;

        let mut slot = self.lock_slot();
        slot.status = ConnectionStatus::NotConnected;
    }
}

/// Run `task` to completion unless the connect cancel signal arrives first.
///
/// Only safe around steps that hold no resources when dropped mid-flight;
/// steps that acquire a dialog, issuer or tunnel process instead run to
/// completion and poll [`cancel_requested`] at their boundaries.
async fn with_cancel<T>(
    cancel: &mut mpsc::Receiver<()>,
    task: impl Future<Output = Result<T, ConnectionError>>,
) -> Result<T, ConnectionError> {
    tokio::select! {
        biased;
        _ = cancel.recv() => Err(ConnectionError::ConnectionCancelled),
        result = task => result,
    }
}

/// True once a concurrent `disconnect` has signalled cancellation.
fn cancel_requested(cancel: &mut mpsc::Receiver<()>) -> bool {
    cancel.try_recv().is_ok()
}

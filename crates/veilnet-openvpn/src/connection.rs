//! Process-based tunnel client

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::state::{parse_byte_count, parse_state_line};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use veilnet_connection::{
    Connection, SessionStatsKeeper, StateSender, TunnelError, TunnelState,
};

/// Tunnel client running the OpenVPN binary as a child process.
///
/// `start` spawns the process and a reader task that translates management
/// output into state tokens and byte counters until the process exits.
/// `stop` signals the reader task, which kills the child; the exit is
/// reported as `ProcessExited` on the state channel either way.
pub struct OpenvpnConnection {
    binary: PathBuf,
    config: ClientConfig,
    credentials: Credentials,
    runtime_dir: PathBuf,
    state_tx: StateSender,
    stats: Arc<dyn SessionStatsKeeper>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl OpenvpnConnection {
    pub fn new(
        binary: PathBuf,
        config: ClientConfig,
        credentials: Credentials,
        runtime_dir: PathBuf,
        state_tx: StateSender,
        stats: Arc<dyn SessionStatsKeeper>,
    ) -> Self {
        Self {
            binary,
            config,
            credentials,
            runtime_dir,
            state_tx,
            stats,
            shutdown_tx: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Connection for OpenvpnConnection {
    async fn start(&self) -> Result<(), TunnelError> {
        let args = self
            .config
            .write_material(&self.runtime_dir, &self.credentials)
            .await?;

        debug!(binary = %self.binary.display(), "starting tunnel process");
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TunnelError::Client("tunnel process stdout unavailable".to_string()))?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        *self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(shutdown_tx);

        let _ = self.state_tx.send(TunnelState::ProcessStarted);
        tokio::spawn(supervise(
            child,
            stdout,
            self.state_tx.clone(),
            self.stats.clone(),
            shutdown_rx,
        ));
        Ok(())
    }

    async fn stop(&self) -> Result<(), TunnelError> {
        let shutdown_tx = self
            .shutdown_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match shutdown_tx {
            Some(shutdown_tx) => {
                let _ = shutdown_tx.send(()).await;
                Ok(())
            }
            None => {
                debug!("tunnel process not running, nothing to stop");
                Ok(())
            }
        }
    }
}

/// Reader half of the tunnel process: drains management output, reaps the
/// child, and reports `ProcessExited` as the final token.
async fn supervise(
    mut child: Child,
    stdout: ChildStdout,
    state_tx: StateSender,
    stats: Arc<dyn SessionStatsKeeper>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("stopping tunnel process");
                if let Err(err) = child.start_kill() {
                    warn!("failed to signal tunnel process: {err}");
                }
                // Drain what the process still prints on the way out.
                while let Ok(Some(line)) = lines.next_line().await {
                    handle_line(&line, &state_tx, stats.as_ref());
                }
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&line, &state_tx, stats.as_ref()),
                Ok(None) => break,
                Err(err) => {
                    warn!("failed to read tunnel process output: {err}");
                    break;
                }
            }
        }
    }

    match child.wait().await {
        Ok(status) => debug!("tunnel process exited: {status}"),
        Err(err) => warn!("failed to reap tunnel process: {err}"),
    }
    let _ = state_tx.send(TunnelState::ProcessExited);
}

fn handle_line(line: &str, state_tx: &StateSender, stats: &dyn SessionStatsKeeper) {
    if let Some(state) = parse_state_line(line) {
        let _ = state_tx.send(state);
    } else if let Some(counters) = parse_byte_count(line) {
        stats.save(counters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use veilnet_connection::StatsTracker;

    fn echo_connection(state_tx: StateSender) -> OpenvpnConnection {
        let config = ClientConfig::from_session_config(&json!({
            "remote": "127.0.0.1",
            "port": 1194
        }))
        .unwrap();
        OpenvpnConnection::new(
            PathBuf::from("echo"),
            config,
            Credentials {
                username: "session-100".to_string(),
                password: "abcd".to_string(),
            },
            tempfile::tempdir().unwrap().keep(),
            state_tx,
            Arc::new(StatsTracker::new()),
        )
    }

    #[tokio::test]
    async fn test_start_reports_process_lifecycle() {
        let (state_tx, mut state_rx) = mpsc::unbounded_channel();
        let connection = echo_connection(state_tx);

        connection.start().await.unwrap();

        assert_eq!(state_rx.recv().await, Some(TunnelState::ProcessStarted));
        // `echo` prints the argument list (no state lines) and exits.
        assert_eq!(state_rx.recv().await, Some(TunnelState::ProcessExited));
    }

    #[tokio::test]
    async fn test_missing_binary_fails_start() {
        let (state_tx, _state_rx) = mpsc::unbounded_channel();
        let mut connection = echo_connection(state_tx);
        connection.binary = PathBuf::from("/nonexistent/openvpn-binary");

        let err = connection.start().await.unwrap_err();
        assert!(matches!(err, TunnelError::Process(_)));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_noop() {
        let (state_tx, _state_rx) = mpsc::unbounded_channel();
        let connection = echo_connection(state_tx);
        connection.stop().await.unwrap();
    }
}

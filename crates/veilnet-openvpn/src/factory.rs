//! Connection factory for the `"openvpn"` service type

use crate::config::ClientConfig;
use crate::connection::OpenvpnConnection;
use crate::credentials::Credentials;
use std::path::PathBuf;
use std::sync::Arc;
use veilnet_connection::{
    ConnectOptions, Connection, ConnectionFactory, SessionStatsKeeper, StateSender, TunnelError,
};
use veilnet_identity::SignerFactory;

/// Builds process-based OpenVPN connections.
///
/// Registered in the connection registry under
/// [`crate::SERVICE_TYPE_OPENVPN`] during bootstrap.
pub struct OpenvpnFactory {
    binary: PathBuf,
    runtime_dir: PathBuf,
    signer_factory: SignerFactory,
    stats: Arc<dyn SessionStatsKeeper>,
}

impl OpenvpnFactory {
    pub fn new(
        binary: impl Into<PathBuf>,
        runtime_dir: impl Into<PathBuf>,
        signer_factory: SignerFactory,
        stats: Arc<dyn SessionStatsKeeper>,
    ) -> Self {
        Self {
            binary: binary.into(),
            runtime_dir: runtime_dir.into(),
            signer_factory,
            stats,
        }
    }
}

impl ConnectionFactory for OpenvpnFactory {
    fn create(
        &self,
        options: ConnectOptions,
        state_tx: StateSender,
    ) -> Result<Arc<dyn Connection>, TunnelError> {
        let config = ClientConfig::from_session_config(&options.session_config)?;

        let signer = (self.signer_factory)(&options.consumer_id);
        let credentials = Credentials::for_session(&options.session_id, signer.as_ref())
            .map_err(|err| TunnelError::Client(err.to_string()))?;

        // Key material of concurrent sessions must not collide.
        let runtime_dir = self.runtime_dir.join(options.session_id.as_str());

        Ok(Arc::new(OpenvpnConnection::new(
            self.binary.clone(),
            config,
            credentials,
            runtime_dir,
            state_tx,
            self.stats.clone(),
        )))
    }
}

//! Connection factory registry

use crate::connection::{Connection, ConnectionFactory};
use crate::error::ConnectionError;
use crate::manager::ConnectOptions;
use crate::state::StateSender;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a proposal's service type to the factory able to build a tunnel
/// client for it.
///
/// Registration happens during bootstrap, before the registry is shared with
/// the manager; `register` is insert-or-replace.
#[derive(Default)]
pub struct ConnectionRegistry {
    factories: HashMap<String, Box<dyn ConnectionFactory>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        service_type: impl Into<String>,
        factory: Box<dyn ConnectionFactory>,
    ) {
        self.factories.insert(service_type.into(), factory);
    }

    /// Build a tunnel client for the session described by `options`, using
    /// the factory registered for the proposal's service type.
    pub fn create_connection(
        &self,
        options: ConnectOptions,
        state_tx: StateSender,
    ) -> Result<Arc<dyn Connection>, ConnectionError> {
        let service_type = options.proposal.service_type.clone();
        let factory = self
            .factories
            .get(&service_type)
            .ok_or(ConnectionError::UnsupportedServiceType(service_type))?;

        factory
            .create(options, state_tx)
            .map_err(|err| ConnectionError::ConnectionFailed(err.to_string()))
    }
}

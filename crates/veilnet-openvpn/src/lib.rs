//! OpenVPN tunnel client service
//!
//! Implements the `"openvpn"` connection factory: the provider's session
//! config is rendered into a client invocation, the tunnel binary runs as a
//! child process, and its management output is translated into the state
//! tokens and byte counters the connection core consumes.

mod config;
mod connection;
mod credentials;
mod definition;
mod factory;
mod state;

pub use config::ClientConfig;
pub use connection::OpenvpnConnection;
pub use credentials::Credentials;
pub use definition::{
    bootstrap, OpenvpnDefinition, PaymentPerTime, PAYMENT_METHOD_PER_TIME, SERVICE_TYPE_OPENVPN,
};
pub use factory::OpenvpnFactory;
pub use state::{parse_byte_count, parse_state_line, state_from_token};

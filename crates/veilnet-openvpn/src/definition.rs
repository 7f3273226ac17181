//! OpenVPN proposal payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use veilnet_discovery::{
    register_payment_method, register_service_definition, Money, PaymentMethod,
    ServiceDefinition,
};

/// Service type tag OpenVPN proposals and the factory register under.
pub const SERVICE_TYPE_OPENVPN: &str = "openvpn";

/// Payment method tag for time-metered sessions.
pub const PAYMENT_METHOD_PER_TIME: &str = "PER_TIME";

/// Service definition payload of an `"openvpn"` proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenvpnDefinition {
    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub protocol: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,
}

impl ServiceDefinition for OpenvpnDefinition {
    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Time-metered payment: `price` buys `duration_secs` of tunnel time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPerTime {
    pub price: Money,
    pub duration_secs: u64,
}

impl PaymentMethod for PaymentPerTime {
    fn price(&self) -> Money {
        self.price.clone()
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Register the OpenVPN proposal payload decoders. Invoked once during node
/// bootstrap, before any proposal is deserialized.
pub fn bootstrap() {
    register_service_definition(SERVICE_TYPE_OPENVPN, |value| {
        serde_json::from_value::<OpenvpnDefinition>(value)
            .map(|definition| Arc::new(definition) as Arc<dyn ServiceDefinition>)
    });
    register_payment_method(PAYMENT_METHOD_PER_TIME, |value| {
        serde_json::from_value::<PaymentPerTime>(value)
            .map(|method| Arc::new(method) as Arc<dyn PaymentMethod>)
    });
}

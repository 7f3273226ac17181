//! Plug-in proposal payloads
//!
//! Service definitions and payment methods are open sets: each service crate
//! registers a decoder for its own tag during bootstrap. Lookups are by exact
//! string match. The registries are process-wide; their mutation window is
//! confined to bootstrap, before any proposal is deserialized.

use crate::Money;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

/// Typed service definition payload of a proposal.
pub trait ServiceDefinition: fmt::Debug + Send + Sync {
    /// JSON form used when the definition is embedded back into a proposal.
    fn to_json(&self) -> Value;
}

/// Typed payment method payload of a proposal.
pub trait PaymentMethod: fmt::Debug + Send + Sync {
    fn price(&self) -> Money;

    /// JSON form used when the method is embedded back into a proposal.
    fn to_json(&self) -> Value;
}

type DefinitionDecoder =
    Arc<dyn Fn(Value) -> Result<Arc<dyn ServiceDefinition>, serde_json::Error> + Send + Sync>;
type PaymentDecoder =
    Arc<dyn Fn(Value) -> Result<Arc<dyn PaymentMethod>, serde_json::Error> + Send + Sync>;

static SERVICE_DEFINITIONS: LazyLock<RwLock<HashMap<String, DefinitionDecoder>>> =
    LazyLock::new(Default::default);
static PAYMENT_METHODS: LazyLock<RwLock<HashMap<String, PaymentDecoder>>> =
    LazyLock::new(Default::default);

/// Register (or replace) the decoder for a service type tag.
pub fn register_service_definition<F>(service_type: &str, decoder: F)
where
    F: Fn(Value) -> Result<Arc<dyn ServiceDefinition>, serde_json::Error> + Send + Sync + 'static,
{
    if let Ok(mut decoders) = SERVICE_DEFINITIONS.write() {
        decoders.insert(service_type.to_string(), Arc::new(decoder));
    }
}

/// Register (or replace) the decoder for a payment method tag.
pub fn register_payment_method<F>(method_type: &str, decoder: F)
where
    F: Fn(Value) -> Result<Arc<dyn PaymentMethod>, serde_json::Error> + Send + Sync + 'static,
{
    if let Ok(mut decoders) = PAYMENT_METHODS.write() {
        decoders.insert(method_type.to_string(), Arc::new(decoder));
    }
}

pub fn service_definition_registered(service_type: &str) -> bool {
    SERVICE_DEFINITIONS
        .read()
        .map(|decoders| decoders.contains_key(service_type))
        .unwrap_or(false)
}

pub fn payment_method_registered(method_type: &str) -> bool {
    PAYMENT_METHODS
        .read()
        .map(|decoders| decoders.contains_key(method_type))
        .unwrap_or(false)
}

/// Decode a service definition payload. Unregistered tags and `null`
/// payloads yield `None` without error, preserving the raw tag on the
/// surrounding proposal.
pub(crate) fn decode_service_definition(
    service_type: &str,
    raw: Option<Value>,
) -> Result<Option<Arc<dyn ServiceDefinition>>, serde_json::Error> {
    let decoder = SERVICE_DEFINITIONS
        .read()
        .ok()
        .and_then(|decoders| decoders.get(service_type).cloned());
    match (decoder, raw) {
        (Some(decoder), Some(value)) if !value.is_null() => decoder(value).map(Some),
        _ => Ok(None),
    }
}

/// Decode a payment method payload, with the same unknown-tag semantics as
/// [`decode_service_definition`].
pub(crate) fn decode_payment_method(
    method_type: &str,
    raw: Option<Value>,
) -> Result<Option<Arc<dyn PaymentMethod>>, serde_json::Error> {
    let decoder = PAYMENT_METHODS
        .read()
        .ok()
        .and_then(|decoders| decoders.get(method_type).cloned());
    match (decoder, raw) {
        (Some(decoder), Some(value)) if !value.is_null() => decoder(value).map(Some),
        _ => Ok(None),
    }
}

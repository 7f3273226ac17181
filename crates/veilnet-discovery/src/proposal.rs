//! Service proposal DTO

use crate::payload::{decode_payment_method, decode_service_definition};
use crate::{Contact, PaymentMethod, ServiceDefinition};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use veilnet_identity::Identity;

/// Wire format revision stamped on proposals composed by this node.
pub const PROPOSAL_FORMAT: &str = "service-proposal/v1";

/// A provider's advertisement of one service: who provides it, how to reach
/// them, and what payment they require.
///
/// The `service_definition` and `payment_method` payloads are decoded through
/// the registries in [`crate::payload`]; a proposal whose tags are not
/// registered still parses, with the typed payloads left empty and the tag
/// strings preserved.
#[derive(Debug, Clone)]
pub struct ServiceProposal {
    /// Per-provider proposal sequence number.
    pub id: i64,

    /// Wire format revision the proposal was published in.
    pub format: String,

    /// Selects the connection factory able to consume this service.
    pub service_type: String,

    pub service_definition: Option<Arc<dyn ServiceDefinition>>,

    pub payment_method_type: String,

    pub payment_method: Option<Arc<dyn PaymentMethod>>,

    /// Author of the proposal.
    pub provider_id: Identity,

    /// Ways of reaching the provider, in preference order.
    pub provider_contacts: Vec<Contact>,
}

impl ServiceProposal {
    /// Stamp the proposal with its author and single contact, resetting the
    /// sequence number and format for publication.
    pub fn set_provider_contact(&mut self, provider_id: Identity, contact: Contact) {
        self.id = 1;
        self.format = PROPOSAL_FORMAT.to_string();
        self.provider_id = provider_id;
        self.provider_contacts = vec![contact];
    }
}

impl Default for ServiceProposal {
    fn default() -> Self {
        Self {
            id: 0,
            format: String::new(),
            service_type: String::new(),
            service_definition: None,
            payment_method_type: String::new(),
            payment_method: None,
            provider_id: Identity::from_address(""),
            provider_contacts: Vec::new(),
        }
    }
}

impl PartialEq for ServiceProposal {
    fn eq(&self, other: &Self) -> bool {
        let definition_json = |d: &Option<Arc<dyn ServiceDefinition>>| {
            d.as_ref().map(|d| d.to_json()).unwrap_or(Value::Null)
        };
        let payment_json = |p: &Option<Arc<dyn PaymentMethod>>| {
            p.as_ref().map(|p| p.to_json()).unwrap_or(Value::Null)
        };

        self.id == other.id
            && self.format == other.format
            && self.service_type == other.service_type
            && definition_json(&self.service_definition) == definition_json(&other.service_definition)
            && self.payment_method_type == other.payment_method_type
            && payment_json(&self.payment_method) == payment_json(&other.payment_method)
            && self.provider_id == other.provider_id
            && self.provider_contacts == other.provider_contacts
    }
}

impl Serialize for ServiceProposal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ServiceProposal", 8)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("format", &self.format)?;
        state.serialize_field("service_type", &self.service_type)?;
        state.serialize_field(
            "service_definition",
            &self.service_definition.as_ref().map(|d| d.to_json()),
        )?;
        state.serialize_field("payment_method_type", &self.payment_method_type)?;
        state.serialize_field(
            "payment_method",
            &self.payment_method.as_ref().map(|p| p.to_json()),
        )?;
        state.serialize_field("provider_id", &self.provider_id)?;
        state.serialize_field("provider_contacts", &self.provider_contacts)?;
        state.end()
    }
}

/// Wire shape with payloads still raw; decoding happens against the
/// registries after the tags are known.
#[derive(Deserialize)]
struct RawProposal {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    format: String,
    #[serde(default)]
    service_type: String,
    #[serde(default)]
    service_definition: Option<Value>,
    #[serde(default)]
    payment_method_type: String,
    #[serde(default)]
    payment_method: Option<Value>,
    #[serde(default)]
    provider_id: String,
    #[serde(default)]
    provider_contacts: Vec<Contact>,
}

impl<'de> Deserialize<'de> for ServiceProposal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawProposal::deserialize(deserializer)?;

        let service_definition =
            decode_service_definition(&raw.service_type, raw.service_definition)
                .map_err(serde::de::Error::custom)?;
        let payment_method = decode_payment_method(&raw.payment_method_type, raw.payment_method)
            .map_err(serde::de::Error::custom)?;

        Ok(Self {
            id: raw.id,
            format: raw.format,
            service_type: raw.service_type,
            service_definition,
            payment_method_type: raw.payment_method_type,
            payment_method,
            provider_id: Identity::from_address(raw.provider_id),
            provider_contacts: raw.provider_contacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        payment_method_registered, register_payment_method, register_service_definition, Money,
    };
    use serde_json::json;
    use std::sync::Once;

    #[derive(Debug, PartialEq)]
    struct MockDefinition;

    impl ServiceDefinition for MockDefinition {
        fn to_json(&self) -> Value {
            json!({})
        }
    }

    #[derive(Debug, PartialEq)]
    struct MockPayment;

    impl PaymentMethod for MockPayment {
        fn price(&self) -> Money {
            Money::default()
        }

        fn to_json(&self) -> Value {
            json!({})
        }
    }

    fn register_mocks() {
        static ONCE: Once = Once::new();
        ONCE.call_once(|| {
            register_service_definition("mock_service", |_| {
                Ok(Arc::new(MockDefinition) as Arc<dyn ServiceDefinition>)
            });
            register_payment_method("mock_payment", |_| {
                Ok(Arc::new(MockPayment) as Arc<dyn PaymentMethod>)
            });
        });
    }

    fn mock_proposal() -> ServiceProposal {
        ServiceProposal {
            id: 1,
            format: "format/X".to_string(),
            service_type: "mock_service".to_string(),
            service_definition: Some(Arc::new(MockDefinition)),
            payment_method_type: "mock_payment".to_string(),
            payment_method: Some(Arc::new(MockPayment)),
            provider_id: Identity::from_address("node"),
            provider_contacts: Vec::new(),
        }
    }

    #[test]
    fn test_set_provider_contact_stamps_publication_fields() {
        let mut proposal = ServiceProposal {
            id: 123,
            provider_id: Identity::from_address("123"),
            ..Default::default()
        };
        proposal.set_provider_contact(
            Identity::from_address("123456"),
            Contact::new("type1"),
        );

        assert_eq!(proposal.id, 1);
        assert_eq!(proposal.format, PROPOSAL_FORMAT);
        assert_eq!(proposal.provider_id, Identity::from_address("123456"));
        assert_eq!(proposal.provider_contacts, vec![Contact::new("type1")]);
    }

    #[test]
    fn test_serialize_known_payloads() {
        register_mocks();

        let actual = serde_json::to_value(mock_proposal()).unwrap();
        let expected = json!({
            "id": 1,
            "format": "format/X",
            "service_type": "mock_service",
            "service_definition": {},
            "payment_method_type": "mock_payment",
            "payment_method": {},
            "provider_id": "node",
            "provider_contacts": []
        });
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_deserialize_known_payloads() {
        register_mocks();

        let parsed: ServiceProposal = serde_json::from_value(json!({
            "id": 1,
            "format": "format/X",
            "service_type": "mock_service",
            "service_definition": {},
            "payment_method_type": "mock_payment",
            "payment_method": {},
            "provider_id": "node",
            "provider_contacts": []
        }))
        .unwrap();

        assert_eq!(parsed, mock_proposal());
    }

    #[test]
    fn test_round_trip_is_identity_for_registered_tags() {
        register_mocks();

        let json = serde_json::to_value(mock_proposal()).unwrap();
        let back: ServiceProposal = serde_json::from_value(json).unwrap();
        assert_eq!(back, mock_proposal());
    }

    #[test]
    fn test_unknown_service_type_keeps_tag_and_drops_payload() {
        let parsed: ServiceProposal = serde_json::from_value(json!({
            "service_type": "unknown",
            "service_definition": {}
        }))
        .unwrap();

        assert_eq!(parsed.service_type, "unknown");
        assert!(parsed.service_definition.is_none());
    }

    #[test]
    fn test_unknown_payment_method_keeps_tag_and_drops_payload() {
        let parsed: ServiceProposal = serde_json::from_value(json!({
            "payment_method_type": "unknown",
            "payment_method": {}
        }))
        .unwrap();

        assert_eq!(parsed.payment_method_type, "unknown");
        assert!(parsed.payment_method.is_none());
    }

    #[test]
    fn test_unknown_tags_survive_round_trip() {
        let parsed: ServiceProposal = serde_json::from_value(json!({
            "service_type": "unknown",
            "service_definition": {"some": "payload"},
            "payment_method_type": "also-unknown",
            "payment_method": {}
        }))
        .unwrap();

        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["service_type"], "unknown");
        assert_eq!(json["service_definition"], Value::Null);
        assert_eq!(json["payment_method_type"], "also-unknown");
        assert_eq!(json["payment_method"], Value::Null);
    }

    #[test]
    fn test_register_payment_method_is_visible() {
        register_payment_method("testable", |_| Ok(Arc::new(MockPayment) as Arc<dyn PaymentMethod>));
        assert!(payment_method_registered("testable"));
    }
}

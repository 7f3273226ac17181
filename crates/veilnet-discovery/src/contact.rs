use serde::{Deserialize, Serialize};

/// One way of reaching a provider, e.g. a broker topic or a direct address.
///
/// Only the `type` tag is interpreted by the core; the remaining fields are
/// carried verbatim for the dialog transport that understands them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "type", default)]
    pub contact_type: String,

    #[serde(flatten)]
    pub definition: serde_json::Map<String, serde_json::Value>,
}

impl Contact {
    pub fn new(contact_type: impl Into<String>) -> Self {
        Self {
            contact_type: contact_type.into(),
            definition: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_carries_extra_fields_through() {
        let parsed: Contact =
            serde_json::from_value(json!({"type": "broker", "topic": "provider-1"})).unwrap();
        assert_eq!(parsed.contact_type, "broker");
        assert_eq!(parsed.definition["topic"], json!("provider-1"));

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back, json!({"type": "broker", "topic": "provider-1"}));
    }
}

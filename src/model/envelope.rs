use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::error::EnvelopeError;

/// The canonical message wrapper.
///
/// Publishers submit it, the broker carries it as the message body, and
/// webhook subscribers receive it unchanged as the JSON request body.
///
/// # Example
///
/// ```rust
/// use hookhub::model::MessageEnvelope;
///
/// let env: MessageEnvelope = serde_json::from_str(r#"{
///     "messageId": "m-1",
///     "timestamp": "2025-08-28T21:55:00Z",
///     "source": "checkout",
///     "destination": { "channel": "payments.order.created", "eventName": "orderCreated" },
///     "payload": { "orderId": 42 }
/// }"#).unwrap();
/// assert!(env.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub destination: Destination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub channel: String,
    pub event_name: String,
}

/// Envelope payload: either a structured document or any other JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Document(Map<String, Value>),
    Scalar(Value),
}

impl Payload {
    /// The document persisted for this payload. Scalars are wrapped as
    /// `{"value": <scalar>}`.
    pub fn to_document(&self) -> Map<String, Value> {
        match self {
            Payload::Document(doc) => doc.clone(),
            Payload::Scalar(value) => {
                let mut doc = Map::new();
                doc.insert("value".to_string(), value.clone());
                doc
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Scalar(Value::Null))
    }
}

impl MessageEnvelope {
    /// Structural checks: identifiers and routing fields must be non-blank
    /// and the payload must be present.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let required = [
            ("messageId", &self.message_id),
            ("source", &self.source),
            ("destination.channel", &self.destination.channel),
            ("destination.eventName", &self.destination.event_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EnvelopeError::Blank(field));
            }
        }
        if self.payload.is_null() {
            return Err(EnvelopeError::NullPayload);
        }
        Ok(())
    }

    pub fn channel(&self) -> &str {
        &self.destination.channel
    }

    pub fn event_name(&self) -> &str {
        &self.destination.event_name
    }
}

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::MessageEnvelope;

/// A message as it travels through the broker.
///
/// The body is the JSON-encoded envelope; the correlation id travels next to
/// it the way a message header would.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub message_id: String,
    pub correlation_id: Option<String>,
    pub body: String,
    /// Unix timestamp (milliseconds) of the publish call.
    pub timestamp: i64,
}

impl Delivery {
    pub fn from_envelope(
        envelope: &MessageEnvelope,
        correlation_id: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            message_id: envelope.message_id.clone(),
            correlation_id: correlation_id.map(str::to_string),
            body: serde_json::to_string(envelope)?,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    pub fn envelope(&self) -> Result<MessageEnvelope, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

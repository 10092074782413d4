use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::broker::{Broker, Delivery};
use crate::channels::ChannelRegistry;
use crate::infrastructure::InfrastructureReconciler;
use crate::model::{MessageEnvelope, MessageLogEntry, PayloadRecord};
use crate::persistence::Persistence;
use crate::utils::error::PublishError;

/// Metadata key copied into the payload record when present.
const SCHEMA_VERSION_KEY: &str = "schemaVersion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishOutcome {
    Published,
    /// The message id was already logged; nothing was written or sent.
    Duplicate,
}

pub struct PublishPipeline {
    registry: Arc<ChannelRegistry>,
    reconciler: Arc<InfrastructureReconciler>,
    persistence: Persistence,
    broker: Arc<dyn Broker>,
    org_prefix: String,
}

impl PublishPipeline {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        reconciler: Arc<InfrastructureReconciler>,
        persistence: Persistence,
        broker: Arc<dyn Broker>,
        org_prefix: &str,
    ) -> Self {
        Self {
            registry,
            reconciler,
            persistence,
            broker,
            org_prefix: org_prefix.to_string(),
        }
    }

    /// Publishes `envelope` to its channel.
    ///
    /// Unknown channels are derived from their name and registered. The
    /// message id is the idempotency key: a second publish of the same id is
    /// reported as [`PublishOutcome::Duplicate`] and has no effect. A broker
    /// failure leaves the log entry `FAILED` and is returned; there is no
    /// retry here.
    pub async fn publish(
        &self,
        envelope: &MessageEnvelope,
        correlation_id: Option<&str>,
    ) -> Result<PublishOutcome, PublishError> {
        envelope.validate()?;
        let message_id = envelope.message_id.as_str();

        let channel = self
            .registry
            .resolve_or_create(envelope.channel(), &self.org_prefix)?;

        if !self.reconciler.reconcile(&channel).await {
            warn!(channel = %channel.name, "Publishing without confirmed infrastructure");
        }

        if self.persistence.message_exists(message_id)? {
            info!(message_id, "Duplicate message ignored");
            return Ok(PublishOutcome::Duplicate);
        }

        let delivery = Delivery::from_envelope(envelope, correlation_id)?;
        let entry = MessageLogEntry::publishing(
            message_id,
            &channel.name,
            &channel.routing_key,
            correlation_id,
            envelope.timestamp,
        );
        let payload = PayloadRecord {
            message_id: message_id.to_string(),
            payload: envelope.payload.to_document(),
            schema_version: envelope
                .metadata
                .as_ref()
                .and_then(|m| m.get(SCHEMA_VERSION_KEY).cloned()),
            created_at: Utc::now(),
        };

        if !self.persistence.insert_message(&entry, &payload)? {
            info!(message_id, "Duplicate message lost the insert race");
            return Ok(PublishOutcome::Duplicate);
        }

        info!(
            exchange = %channel.exchange,
            routing_key = %channel.routing_key,
            message_id,
            "Publishing message"
        );

        match self
            .broker
            .publish(&channel.exchange, &channel.routing_key, delivery)
            .await
        {
            Ok(()) => {
                self.persistence
                    .update_message(message_id, MessageLogEntry::mark_published)?;
                info!(message_id, "Message published");
                Ok(PublishOutcome::Published)
            }
            Err(e) => {
                error!(message_id, error = %e, "Failed to publish message");
                let reason = e.to_string();
                self.persistence
                    .update_message(message_id, |m| m.mark_failed(&reason))?;
                Err(e.into())
            }
        }
    }
}

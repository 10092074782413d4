use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Publishing,
    Published,
    Failed,
}

/// One row per published message id. The id is the idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageLogEntry {
    pub message_id: String,
    pub channel: String,
    pub routing_key: String,
    pub status: MessageStatus,
    pub attempts: u32,
    pub correlation_id: Option<String>,
    pub error_message: Option<String>,
    pub produced_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MessageLogEntry {
    pub fn publishing(
        message_id: &str,
        channel: &str,
        routing_key: &str,
        correlation_id: Option<&str>,
        produced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id: message_id.to_string(),
            channel: channel.to_string(),
            routing_key: routing_key.to_string(),
            status: MessageStatus::Publishing,
            attempts: 0,
            correlation_id: correlation_id.map(str::to_string),
            error_message: None,
            produced_at,
            published_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_published(&mut self) {
        self.status = MessageStatus::Published;
        self.attempts += 1;
        self.published_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: &str) {
        self.status = MessageStatus::Failed;
        self.attempts += 1;
        self.error_message = Some(error.to_string());
    }
}

/// The structured payload of a published message, stored once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadRecord {
    pub message_id: String,
    pub payload: Map<String, Value>,
    pub schema_version: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Receives deliveries.
    Active,
    /// Switched off by its owner.
    Inactive,
    /// Switched off because of delivery errors.
    Suspended,
}

/// What a squad sends to subscribe a webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub webhook_url: String,
    pub squad_name: String,
    pub topic: String,
    pub event_name: String,
}

/// A webhook subscription together with its delivery health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub webhook_url: String,
    pub squad_name: String,
    pub topic: String,
    pub event_name: String,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub failed_attempts: u32,
    pub last_error: Option<String>,
    pub last_successful_delivery: Option<DateTime<Utc>>,
}

impl Subscription {
    /// A fresh, active subscription with a generated id.
    pub fn from_request(request: SubscriptionRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            webhook_url: request.webhook_url,
            squad_name: request.squad_name,
            topic: request.topic,
            event_name: request.event_name,
            status: SubscriptionStatus::Active,
            created_at: now,
            updated_at: now,
            failed_attempts: 0,
            last_error: None,
            last_successful_delivery: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn record_success(&mut self) {
        let now = Utc::now();
        self.failed_attempts = 0;
        self.last_error = None;
        self.last_successful_delivery = Some(now);
        self.updated_at = now;
    }

    pub fn record_failure(&mut self, error: &str) {
        self.failed_attempts += 1;
        self.last_error = Some(error.to_string());
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> SubscriptionSummary {
        SubscriptionSummary {
            topic: self.topic.clone(),
            event_name: self.event_name.clone(),
            squad_name: self.squad_name.clone(),
            webhook_url: self.webhook_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub topic: String,
    pub event_name: String,
    pub squad_name: String,
    pub webhook_url: String,
}

/// Overview of the subscribed events, built from the active subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionList {
    pub total_subscriptions: usize,
    pub active_subscriptions: usize,
    pub events: Vec<SubscriptionSummary>,
}

//! The `broker` module is the boundary between hookhub and the message broker.
//!
//! [`Broker`] describes what hookhub needs from a broker: idempotent
//! declaration of exchanges, queues and bindings, passive existence probes,
//! publishing to an exchange with a routing key, and consuming a queue.
//!
//! [`InMemoryBroker`] is the in-process implementation used by the server
//! binary and the tests. It follows AMQP topic-exchange semantics closely
//! enough for routing keys, durable declarations and per-queue consumers to
//! behave as they would against a real broker.

pub mod engine;
pub mod message;
pub mod topic;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::utils::error::BrokerError;

pub use engine::InMemoryBroker;
pub use message::Delivery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Topic,
    Direct,
    Fanout,
}

impl ExchangeKind {
    /// Parses a configured exchange type; `None` for unknown types.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.to_lowercase().as_str() {
            "topic" => Some(ExchangeKind::Topic),
            "direct" => Some(ExchangeKind::Direct),
            "fanout" => Some(ExchangeKind::Fanout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
    pub auto_delete: bool,
}

impl ExchangeSpec {
    /// A durable, non auto-deleting topic exchange.
    pub fn durable_topic(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ExchangeKind::Topic,
            durable: true,
            auto_delete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
}

impl QueueSpec {
    pub fn durable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            durable: true,
            auto_delete: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingSpec {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

impl BindingSpec {
    pub fn new(exchange: &str, queue: &str, routing_key: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            queue: queue.to_string(),
            routing_key: routing_key.to_string(),
        }
    }

    /// Memo key for this binding, `exchange:queue:routing_key`.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.exchange, self.queue, self.routing_key)
    }
}

/// Operations hookhub performs against a message broker.
///
/// Declarations are idempotent: declaring something that already exists with
/// the same properties succeeds.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError>;

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError>;

    async fn declare_binding(&self, spec: &BindingSpec) -> Result<(), BrokerError>;

    /// Passive probe; never creates anything.
    async fn exchange_exists(&self, name: &str) -> Result<bool, BrokerError>;

    /// Passive probe; never creates anything.
    async fn queue_exists(&self, name: &str) -> Result<bool, BrokerError>;

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        delivery: Delivery,
    ) -> Result<(), BrokerError>;

    /// Starts consuming `queue`. Deliveries arrive on the returned receiver
    /// until the broker drops the consumer.
    async fn consume(&self, queue: &str) -> Result<UnboundedReceiver<Delivery>, BrokerError>;
}

//! In-process broker engine
//!
//! This module contains the in-memory broker used by hookhub when no external
//! broker is wired in. It is responsible for:
//! - keeping the declared exchanges, queues and bindings
//! - routing published messages to bound queues (topic/direct/fanout)
//! - handing deliveries to queue consumers, round-robin, and buffering them
//!   while a queue has no consumer
//!
//! Concurrency and usage notes:
//! - All state sits behind one `std::sync::Mutex`. Every operation takes the
//!   lock, does its bookkeeping and releases it before returning, so the lock
//!   is never held across an `.await`.
//! - Consumers receive deliveries over unbounded channels. A consumer whose
//!   receiver was dropped is removed on the next delivery attempt.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::broker::message::Delivery;
use crate::broker::topic::Exchange;
use crate::broker::{BindingSpec, Broker, ExchangeSpec, QueueSpec};
use crate::utils::error::BrokerError;

#[derive(Debug)]
struct Queue {
    durable: bool,
    auto_delete: bool,
    consumers: Vec<UnboundedSender<Delivery>>,
    next_consumer: usize,
    backlog: VecDeque<Delivery>,
}

impl Queue {
    fn new(spec: &QueueSpec) -> Self {
        Self {
            durable: spec.durable,
            auto_delete: spec.auto_delete,
            consumers: Vec::new(),
            next_consumer: 0,
            backlog: VecDeque::new(),
        }
    }

    /// Hands the delivery to the next live consumer, or buffers it.
    fn push(&mut self, mut delivery: Delivery) {
        while !self.consumers.is_empty() {
            let idx = self.next_consumer % self.consumers.len();
            match self.consumers[idx].send(delivery) {
                Ok(()) => {
                    self.next_consumer = idx + 1;
                    return;
                }
                Err(mpsc::error::SendError(returned)) => {
                    self.consumers.remove(idx);
                    delivery = returned;
                }
            }
        }
        self.backlog.push_back(delivery);
    }
}

#[derive(Debug, Default)]
struct State {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, Queue>,
}

/// Broker that lives inside the hookhub process.
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    state: Mutex<State>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, BrokerError> {
        self.state
            .lock()
            .map_err(|_| BrokerError::Unavailable("broker state poisoned".to_string()))
    }

    /// Messages waiting in `queue` for a consumer.
    pub fn backlog_len(&self, queue: &str) -> usize {
        self.state()
            .map(|s| s.queues.get(queue).map_or(0, |q| q.backlog.len()))
            .unwrap_or(0)
    }

    pub fn is_bound(&self, exchange: &str, queue: &str, routing_key: &str) -> bool {
        self.state()
            .map(|s| {
                s.exchanges
                    .get(exchange)
                    .is_some_and(|e| e.is_bound(queue, routing_key))
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        if let Some(existing) = state.exchanges.get(&spec.name) {
            if existing.kind != spec.kind
                || existing.durable != spec.durable
                || existing.auto_delete != spec.auto_delete
            {
                return Err(BrokerError::PreconditionFailed(format!(
                    "exchange '{}' already declared with different properties",
                    spec.name
                )));
            }
            debug!(exchange = %spec.name, "Exchange already declared");
            return Ok(());
        }

        state.exchanges.insert(
            spec.name.clone(),
            Exchange::new(&spec.name, spec.kind, spec.durable, spec.auto_delete),
        );
        info!(exchange = %spec.name, kind = ?spec.kind, "Declared exchange");
        Ok(())
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        if let Some(existing) = state.queues.get(&spec.name) {
            if existing.durable != spec.durable || existing.auto_delete != spec.auto_delete {
                return Err(BrokerError::PreconditionFailed(format!(
                    "queue '{}' already declared with different properties",
                    spec.name
                )));
            }
            debug!(queue = %spec.name, "Queue already declared");
            return Ok(());
        }

        state.queues.insert(spec.name.clone(), Queue::new(spec));
        info!(queue = %spec.name, durable = spec.durable, "Declared queue");
        Ok(())
    }

    async fn declare_binding(&self, spec: &BindingSpec) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        if !state.queues.contains_key(&spec.queue) {
            return Err(BrokerError::QueueNotFound(spec.queue.clone()));
        }
        let exchange = state
            .exchanges
            .get_mut(&spec.exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(spec.exchange.clone()))?;

        exchange.bind(spec);
        info!(
            exchange = %spec.exchange,
            queue = %spec.queue,
            routing_key = %spec.routing_key,
            "Declared binding"
        );
        Ok(())
    }

    async fn exchange_exists(&self, name: &str) -> Result<bool, BrokerError> {
        Ok(self.state()?.exchanges.contains_key(name))
    }

    async fn queue_exists(&self, name: &str) -> Result<bool, BrokerError> {
        Ok(self.state()?.queues.contains_key(name))
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        delivery: Delivery,
    ) -> Result<(), BrokerError> {
        let mut state = self.state()?;
        let targets = state
            .exchanges
            .get(exchange)
            .ok_or_else(|| BrokerError::ExchangeNotFound(exchange.to_string()))?
            .route(routing_key);

        if targets.is_empty() {
            warn!(
                exchange,
                routing_key,
                message_id = %delivery.message_id,
                "Message not routed to any queue"
            );
            return Ok(());
        }

        for queue in targets {
            if let Some(q) = state.queues.get_mut(&queue) {
                q.push(delivery.clone());
            }
        }
        debug!(exchange, routing_key, message_id = %delivery.message_id, "Routed message");
        Ok(())
    }

    async fn consume(&self, queue: &str) -> Result<UnboundedReceiver<Delivery>, BrokerError> {
        let mut state = self.state()?;
        let q = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| BrokerError::QueueNotFound(queue.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        while let Some(pending) = q.backlog.pop_front() {
            let _ = tx.send(pending);
        }
        q.consumers.push(tx);
        info!(queue, consumers = q.consumers.len(), "Consumer attached");
        Ok(rx)
    }
}

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

use crate::broker::{Broker, Delivery};
use crate::channels::ChannelRegistry;
use crate::dispatch::engine::DispatchEngine;
use crate::utils::error::BrokerError;

/// Consumes the channel queues and dispatches every delivery.
///
/// One queue per channel, named after it. Channels registered at runtime are
/// picked up by [`DispatchConsumer::run`], which re-attaches periodically.
pub struct DispatchConsumer {
    broker: Arc<dyn Broker>,
    registry: Arc<ChannelRegistry>,
    engine: Arc<DispatchEngine>,
    attached: DashSet<String>,
    poll_interval: Duration,
}

impl DispatchConsumer {
    pub fn new(
        broker: Arc<dyn Broker>,
        registry: Arc<ChannelRegistry>,
        engine: Arc<DispatchEngine>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            broker,
            registry,
            engine,
            attached: DashSet::new(),
            poll_interval,
        }
    }

    /// Starts consuming `queue`. Returns `false` if it was already attached.
    pub async fn attach(&self, queue: &str) -> Result<bool, BrokerError> {
        if !self.attached.insert(queue.to_string()) {
            return Ok(false);
        }
        let deliveries = match self.broker.consume(queue).await {
            Ok(deliveries) => deliveries,
            Err(e) => {
                self.attached.remove(queue);
                return Err(e);
            }
        };
        tokio::spawn(consume_loop(
            queue.to_string(),
            deliveries,
            self.engine.clone(),
        ));
        Ok(true)
    }

    /// Attaches to the queue of every registered channel not consumed yet.
    /// Queues that cannot be consumed are logged and retried on the next call.
    pub async fn attach_all(&self) -> usize {
        let mut attached = 0;
        for channel in self.registry.all().values() {
            match self.attach(channel.queue()).await {
                Ok(true) => attached += 1,
                Ok(false) => {}
                Err(e) => error!(queue = channel.queue(), error = %e, "Cannot consume queue"),
            }
        }
        attached
    }

    /// Re-attaches every `poll_interval` until the task is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            let attached = self.attach_all().await;
            if attached > 0 {
                info!(attached, total = self.attached.len(), "Attached consumers");
            }
        }
    }

    pub fn attached(&self) -> usize {
        self.attached.len()
    }
}

async fn consume_loop(
    queue: String,
    mut deliveries: UnboundedReceiver<Delivery>,
    engine: Arc<DispatchEngine>,
) {
    info!(queue = %queue, "Consumer started");
    while let Some(delivery) = deliveries.recv().await {
        let engine = engine.clone();
        let queue = queue.clone();
        tokio::spawn(async move { handle_delivery(&engine, &queue, delivery).await });
    }
    info!(queue = %queue, "Consumer stopped");
}

async fn handle_delivery(engine: &DispatchEngine, queue: &str, delivery: Delivery) {
    let envelope = match delivery.envelope() {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(message_id = %delivery.message_id, error = %e, "Undecodable delivery dropped");
            return;
        }
    };
    // Each channel's queue is named after it. A message routed here through an
    // overlapping binding is dispatched from its own channel's queue.
    if envelope.channel() != queue {
        debug!(
            queue,
            channel = envelope.channel(),
            message_id = %envelope.message_id,
            "Delivery belongs to another channel, skipped"
        );
        return;
    }
    info!(
        message_id = %envelope.message_id,
        channel = envelope.channel(),
        "Received message for dispatch"
    );
    let report = engine
        .dispatch(&envelope, delivery.correlation_id.as_deref())
        .await;
    info!(
        message_id = %envelope.message_id,
        matched = report.matched,
        delivered = report.delivered,
        failed = report.failed,
        "Dispatch finished"
    );
}

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::channels::ChannelRegistry;
use crate::client::{WebhookClient, WebhookRequest};
use crate::dispatch::retry::RetryPolicy;
use crate::model::{MessageEnvelope, Subscription};
use crate::subscription::SubscriptionService;

/// What happened to one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub matched: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct DispatchEngine {
    registry: Arc<ChannelRegistry>,
    subscriptions: Arc<SubscriptionService>,
    client: Arc<dyn WebhookClient>,
    retry: RetryPolicy,
}

impl DispatchEngine {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        subscriptions: Arc<SubscriptionService>,
        client: Arc<dyn WebhookClient>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            subscriptions,
            client,
            retry,
        }
    }

    /// Delivers `envelope` to every active subscription matching its
    /// channel's routing key and its event name.
    ///
    /// Subscribers are served concurrently and independently; a failing
    /// webhook never affects the others and nothing is returned as an error.
    pub async fn dispatch(
        &self,
        envelope: &MessageEnvelope,
        correlation_id: Option<&str>,
    ) -> DispatchReport {
        let message_id = envelope.message_id.as_str();

        let Some(channel) = self.registry.find(envelope.channel()) else {
            warn!(
                channel = envelope.channel(),
                message_id, "Channel not registered, dropping message"
            );
            return DispatchReport::default();
        };

        let targets = match self
            .subscriptions
            .find_matching(&channel.routing_key, envelope.event_name())
        {
            Ok(targets) => targets,
            Err(e) => {
                error!(message_id, error = %e, "Failed to load subscriptions");
                return DispatchReport::default();
            }
        };

        if targets.is_empty() {
            debug!(
                topic = %channel.routing_key,
                event = envelope.event_name(),
                "No subscriptions matched"
            );
            return DispatchReport::default();
        }

        info!(message_id, webhooks = targets.len(), "Dispatching message");

        let outcomes = join_all(
            targets
                .iter()
                .map(|sub| self.deliver(sub, envelope, correlation_id)),
        )
        .await;

        let delivered = outcomes.iter().filter(|ok| **ok).count();
        DispatchReport {
            matched: targets.len(),
            delivered,
            failed: targets.len() - delivered,
        }
    }

    async fn deliver(
        &self,
        subscription: &Subscription,
        envelope: &MessageEnvelope,
        correlation_id: Option<&str>,
    ) -> bool {
        let url = subscription.webhook_url.as_str();
        let request = WebhookRequest {
            envelope: envelope.clone(),
            correlation_id: correlation_id.map(str::to_string),
            subscription_id: subscription.id.clone(),
        };

        let client = self.client.as_ref();
        let request = &request;
        let result = self
            .retry
            .run(url, move |_| client.deliver(url, request))
            .await;

        match result {
            Ok(()) => {
                if let Err(e) = self.subscriptions.record_delivery_success(&subscription.id) {
                    error!(subscription_id = %subscription.id, error = %e, "Failed to record delivery");
                }
                debug!(url, subscription_id = %subscription.id, "Webhook delivered");
                true
            }
            Err(delivery_error) => {
                let reason = delivery_error.to_string();
                if let Err(e) = self
                    .subscriptions
                    .record_delivery_failure(&subscription.id, &reason)
                {
                    error!(subscription_id = %subscription.id, error = %e, "Failed to record delivery failure");
                }
                error!(
                    url,
                    subscription_id = %subscription.id,
                    message_id = %envelope.message_id,
                    error = %reason,
                    "Webhook delivery failed"
                );
                false
            }
        }
    }
}

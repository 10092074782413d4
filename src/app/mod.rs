//! Wiring of the hookhub components from [`Settings`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::broker::{Broker, InMemoryBroker};
use crate::channels::ChannelRegistry;
use crate::client::{HttpWebhookClient, WebhookClient};
use crate::config::Settings;
use crate::dispatch::{DispatchConsumer, DispatchEngine, RetryPolicy};
use crate::infrastructure::{
    InfrastructureInitializer, InfrastructureReconciler, InfrastructureStatus, ReconcileMode,
    ReconcileReport,
};
use crate::persistence::Persistence;
use crate::publish::PublishPipeline;
use crate::subscription::SubscriptionService;
use crate::utils::error::StartupError;

/// Everything a running hookhub needs, shared by the command server and the
/// consumers.
pub struct App {
    pub settings: Settings,
    pub broker: Arc<dyn Broker>,
    pub persistence: Persistence,
    pub registry: Arc<ChannelRegistry>,
    pub reconciler: Arc<InfrastructureReconciler>,
    pub initializer: Arc<InfrastructureInitializer>,
    pub subscriptions: Arc<SubscriptionService>,
    pub publisher: Arc<PublishPipeline>,
    pub dispatcher: Arc<DispatchEngine>,
    pub consumer: Arc<DispatchConsumer>,
}

impl App {
    /// Builds the application with the in-process broker and the HTTP
    /// webhook client.
    pub fn build(settings: Settings) -> Result<Self, StartupError> {
        let client = HttpWebhookClient::new(&settings.webhook)?;
        Self::with_components(settings, Arc::new(InMemoryBroker::new()), Arc::new(client))
    }

    pub fn with_components(
        settings: Settings,
        broker: Arc<dyn Broker>,
        client: Arc<dyn WebhookClient>,
    ) -> Result<Self, StartupError> {
        let mode = ReconcileMode::parse(&settings.broker.reconcile_mode)
            .ok_or_else(|| StartupError::ReconcileMode(settings.broker.reconcile_mode.clone()))?;
        let persistence = Persistence::open(&settings.persistence.path)?;

        let registry = Arc::new(ChannelRegistry::with_channels(settings.channels.clone()));
        let reconciler = Arc::new(InfrastructureReconciler::new(
            mode,
            broker.clone(),
            registry.clone(),
        ));
        let initializer = Arc::new(InfrastructureInitializer::new(
            broker.clone(),
            settings.infrastructure.clone(),
        ));
        let subscriptions = Arc::new(SubscriptionService::new(persistence.clone()));
        let publisher = Arc::new(PublishPipeline::new(
            registry.clone(),
            reconciler.clone(),
            persistence.clone(),
            broker.clone(),
            &settings.broker.org_prefix,
        ));
        let dispatcher = Arc::new(DispatchEngine::new(
            registry.clone(),
            subscriptions.clone(),
            client,
            RetryPolicy::from_settings(&settings.webhook),
        ));
        let consumer = Arc::new(DispatchConsumer::new(
            broker.clone(),
            registry.clone(),
            dispatcher.clone(),
            Duration::from_millis(settings.broker.consumer_poll_ms.max(1)),
        ));

        info!(
            mode = ?mode,
            channels = registry.len(),
            org_prefix = %settings.broker.org_prefix,
            "Application assembled"
        );

        Ok(Self {
            settings,
            broker,
            persistence,
            registry,
            reconciler,
            initializer,
            subscriptions,
            publisher,
            dispatcher,
            consumer,
        })
    }

    /// Declares the static infrastructure, reconciles every configured
    /// channel and attaches the consumers.
    pub async fn prepare(&self) -> (InfrastructureStatus, ReconcileReport) {
        let status = self.initializer.run().await;
        let report = self.reconciler.reconcile_all().await;
        let attached = self.consumer.attach_all().await;
        info!(attached, "Consumers attached");
        (status, report)
    }
}

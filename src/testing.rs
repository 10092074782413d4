//! Test doubles shared by the module tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::broker::{BindingSpec, Broker, Delivery, ExchangeSpec, InMemoryBroker, QueueSpec};
use crate::client::{WebhookClient, WebhookRequest};
use crate::utils::error::{BrokerError, DeliveryError};

/// Wraps an [`InMemoryBroker`], counting calls and failing on demand.
#[derive(Debug, Default)]
pub struct RecordingBroker {
    pub inner: InMemoryBroker,
    pub exchange_declares: AtomicUsize,
    pub queue_declares: AtomicUsize,
    pub binding_declares: AtomicUsize,
    pub exists_probes: AtomicUsize,
    pub publishes: AtomicUsize,
    pub fail_exchanges: AtomicBool,
    pub fail_queues: AtomicBool,
    pub fail_publish: AtomicBool,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_exchanges() -> Self {
        let broker = Self::default();
        broker.fail_exchanges.store(true, Ordering::SeqCst);
        broker
    }

    pub fn failing_publish() -> Self {
        let broker = Self::default();
        broker.fail_publish.store(true, Ordering::SeqCst);
        broker
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn unavailable() -> BrokerError {
    BrokerError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl Broker for RecordingBroker {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), BrokerError> {
        self.exchange_declares.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchanges.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.declare_exchange(spec).await
    }

    async fn declare_queue(&self, spec: &QueueSpec) -> Result<(), BrokerError> {
        self.queue_declares.fetch_add(1, Ordering::SeqCst);
        if self.fail_queues.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.declare_queue(spec).await
    }

    async fn declare_binding(&self, spec: &BindingSpec) -> Result<(), BrokerError> {
        self.binding_declares.fetch_add(1, Ordering::SeqCst);
        self.inner.declare_binding(spec).await
    }

    async fn exchange_exists(&self, name: &str) -> Result<bool, BrokerError> {
        self.exists_probes.fetch_add(1, Ordering::SeqCst);
        self.inner.exchange_exists(name).await
    }

    async fn queue_exists(&self, name: &str) -> Result<bool, BrokerError> {
        self.exists_probes.fetch_add(1, Ordering::SeqCst);
        self.inner.queue_exists(name).await
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        delivery: Delivery,
    ) -> Result<(), BrokerError> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.publish(exchange, routing_key, delivery).await
    }

    async fn consume(&self, queue: &str) -> Result<UnboundedReceiver<Delivery>, BrokerError> {
        self.inner.consume(queue).await
    }
}

/// Webhook client answering from a per-URL script of outcomes.
///
/// URLs without a script (or with an exhausted one) succeed.
#[derive(Debug, Default)]
pub struct ScriptedWebhookClient {
    scripts: Mutex<Vec<(String, VecDeque<Result<(), DeliveryError>>)>>,
    calls: Mutex<Vec<(String, WebhookRequest)>>,
}

impl ScriptedWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, outcomes: Vec<Result<(), DeliveryError>>) {
        self.scripts
            .lock()
            .unwrap()
            .push((url.to_string(), outcomes.into()));
    }

    pub fn always_fail(&self, url: &str, status: u16) {
        self.script(url, (0..16).map(|_| Err(DeliveryError::Status(status))).collect());
    }

    pub fn calls(&self) -> Vec<(String, WebhookRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }
}

#[async_trait]
impl WebhookClient for ScriptedWebhookClient {
    async fn deliver(&self, url: &str, request: &WebhookRequest) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), request.clone()));
        let mut scripts = self.scripts.lock().unwrap();
        scripts
            .iter_mut()
            .find(|(u, _)| u == url)
            .and_then(|(_, outcomes)| outcomes.pop_front())
            .unwrap_or(Ok(()))
    }
}

/// An [`App`](crate::app::App) over an in-memory broker, a scripted webhook
/// client and a sled database inside `dir`.
pub fn test_app(
    dir: &tempfile::TempDir,
    client: std::sync::Arc<ScriptedWebhookClient>,
) -> crate::app::App {
    let mut settings = crate::config::Settings::default();
    settings.persistence.path = dir.path().join("db").to_string_lossy().into_owned();
    settings.broker.org_prefix = "acme".to_string();
    settings.broker.consumer_poll_ms = 10;
    settings.webhook.backoff_ms = 1;
    crate::app::App::with_components(
        settings,
        std::sync::Arc::new(InMemoryBroker::new()),
        client,
    )
    .unwrap()
}

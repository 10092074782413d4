use std::sync::Arc;

use dashmap::DashMap;
use tracing::{error, info, warn};

use crate::broker::{BindingSpec, Broker, ExchangeKind, ExchangeSpec, QueueSpec};
use crate::config::{BindingConfig, ExchangeConfig, InfrastructureSettings, QueueConfig};
use crate::infrastructure::InfrastructureStatus;

/// Declares the statically configured exchanges, queues and bindings.
///
/// Each item is attempted on its own; a failure is recorded and the rest
/// carry on. A binding is only declared when this initializer created both
/// its exchange and its queue. Running again skips what already succeeded.
pub struct InfrastructureInitializer {
    broker: Arc<dyn Broker>,
    settings: InfrastructureSettings,
    exchanges: DashMap<String, bool>,
    queues: DashMap<String, bool>,
    bindings: DashMap<String, bool>,
}

impl InfrastructureInitializer {
    pub fn new(broker: Arc<dyn Broker>, settings: InfrastructureSettings) -> Self {
        Self {
            broker,
            settings,
            exchanges: DashMap::new(),
            queues: DashMap::new(),
            bindings: DashMap::new(),
        }
    }

    pub async fn run(&self) -> InfrastructureStatus {
        if self.settings.is_empty() {
            info!("No static infrastructure configured");
            return self.status();
        }

        for exchange in &self.settings.exchanges {
            self.declare_exchange(exchange).await;
        }
        for queue in &self.settings.queues {
            self.declare_queue(queue).await;
        }
        for binding in &self.settings.bindings {
            self.declare_binding(binding).await;
        }

        let status = self.status();
        if status.is_complete() {
            info!(?status, "Static infrastructure initialized");
        } else {
            warn!(?status, "Static infrastructure partially initialized");
        }
        status
    }

    pub fn status(&self) -> InfrastructureStatus {
        InfrastructureStatus {
            total_exchanges: self.settings.exchanges.len(),
            created_exchanges: created(&self.exchanges),
            total_queues: self.settings.queues.len(),
            created_queues: created(&self.queues),
            total_bindings: self.settings.bindings.len(),
            created_bindings: created(&self.bindings),
        }
    }

    async fn declare_exchange(&self, config: &ExchangeConfig) {
        if succeeded(&self.exchanges, &config.name) {
            return;
        }
        let kind = ExchangeKind::parse(&config.kind).unwrap_or_else(|| {
            warn!(
                exchange = %config.name,
                kind = %config.kind,
                "Unknown exchange type, using topic"
            );
            ExchangeKind::Topic
        });
        let spec = ExchangeSpec {
            name: config.name.clone(),
            kind,
            durable: config.durable,
            auto_delete: config.auto_delete,
        };
        let ok = match self.broker.declare_exchange(&spec).await {
            Ok(()) => true,
            Err(e) => {
                error!(exchange = %config.name, error = %e, "Failed to create exchange");
                false
            }
        };
        self.exchanges.insert(config.name.clone(), ok);
    }

    async fn declare_queue(&self, config: &QueueConfig) {
        if succeeded(&self.queues, &config.name) {
            return;
        }
        let spec = QueueSpec {
            name: config.name.clone(),
            durable: config.durable,
            auto_delete: config.auto_delete,
        };
        let ok = match self.broker.declare_queue(&spec).await {
            Ok(()) => true,
            Err(e) => {
                error!(queue = %config.name, error = %e, "Failed to create queue");
                false
            }
        };
        self.queues.insert(config.name.clone(), ok);
    }

    async fn declare_binding(&self, config: &BindingConfig) {
        let spec = BindingSpec::new(&config.exchange, &config.queue, &config.routing_key);
        let key = spec.key();
        if succeeded(&self.bindings, &key) {
            return;
        }
        if !succeeded(&self.exchanges, &config.exchange) || !succeeded(&self.queues, &config.queue) {
            warn!(binding = %key, "Skipping binding, exchange or queue not created");
            self.bindings.insert(key, false);
            return;
        }
        let ok = match self.broker.declare_binding(&spec).await {
            Ok(()) => true,
            Err(e) => {
                error!(binding = %key, error = %e, "Failed to create binding");
                false
            }
        };
        self.bindings.insert(key, ok);
    }
}

fn succeeded(memo: &DashMap<String, bool>, key: &str) -> bool {
    memo.get(key).is_some_and(|ok| *ok)
}

fn created(memo: &DashMap<String, bool>) -> usize {
    memo.iter().filter(|entry| *entry.value()).count()
}

use std::sync::Arc;

use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::broker::{BindingSpec, Broker, ExchangeSpec, QueueSpec};
use crate::channels::{Channel, ChannelRegistry};
use crate::infrastructure::ChannelStatus;

/// How the reconciler treats missing infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Declare whatever is missing.
    Ensure,
    /// Only check that it exists; never create anything.
    Validate,
}

impl ReconcileMode {
    pub fn parse(mode: &str) -> Option<Self> {
        match mode.to_lowercase().as_str() {
            "ensure" => Some(ReconcileMode::Ensure),
            "validate" => Some(ReconcileMode::Validate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub reconciled: usize,
    pub total: usize,
}

/// Brings the exchange, queue and binding of a channel into place.
///
/// Every object that was declared (or found, in validate mode) is remembered,
/// and remembered objects are never sent to the broker again. Failures are
/// logged and reported through the return value, never raised.
pub struct InfrastructureReconciler {
    mode: ReconcileMode,
    broker: Arc<dyn Broker>,
    registry: Arc<ChannelRegistry>,
    exchanges: DashSet<String>,
    queues: DashSet<String>,
    bindings: DashSet<String>,
}

impl std::fmt::Debug for InfrastructureReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfrastructureReconciler")
            .field("mode", &self.mode)
            .field("exchanges", &self.exchanges.len())
            .field("queues", &self.queues.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl InfrastructureReconciler {
    pub fn new(mode: ReconcileMode, broker: Arc<dyn Broker>, registry: Arc<ChannelRegistry>) -> Self {
        Self {
            mode,
            broker,
            registry,
            exchanges: DashSet::new(),
            queues: DashSet::new(),
            bindings: DashSet::new(),
        }
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    /// Returns `true` when the channel's exchange, queue and binding are in place.
    pub async fn reconcile(&self, channel: &Channel) -> bool {
        match self.mode {
            ReconcileMode::Ensure => self.ensure(channel).await,
            ReconcileMode::Validate => self.validate(channel).await,
        }
    }

    /// Reconciles a registered channel by name; `false` for unknown channels.
    pub async fn reconcile_named(&self, name: &str) -> bool {
        match self.registry.find(name) {
            Some(channel) => self.reconcile(&channel).await,
            None => {
                warn!(channel = name, "Cannot reconcile unknown channel");
                false
            }
        }
    }

    /// Reconciles every registered channel, one after the other.
    pub async fn reconcile_all(&self) -> ReconcileReport {
        let channels = self.registry.all();
        let total = channels.len();
        let mut reconciled = 0;
        for channel in channels.values() {
            if self.reconcile(channel).await {
                reconciled += 1;
            }
        }
        info!(mode = ?self.mode, reconciled, total, "Reconciled channel infrastructure");
        ReconcileReport { reconciled, total }
    }

    /// Whether everything for `name` has already been reconciled. Does not
    /// touch the broker.
    pub fn is_ready(&self, name: &str) -> bool {
        self.registry
            .find(name)
            .is_some_and(|channel| self.is_channel_ready(&channel))
    }

    pub fn channel_status(&self, name: &str) -> Option<ChannelStatus> {
        self.registry.find(name).map(|channel| self.status_of(&channel))
    }

    pub fn list_channels(&self) -> Vec<ChannelStatus> {
        self.registry
            .all()
            .values()
            .map(|channel| self.status_of(channel))
            .collect()
    }

    fn status_of(&self, channel: &Channel) -> ChannelStatus {
        ChannelStatus {
            channel_name: channel.name.clone(),
            exchange: channel.exchange.clone(),
            routing_key: channel.routing_key.clone(),
            infrastructure_ready: self.is_channel_ready(channel),
        }
    }

    fn is_channel_ready(&self, channel: &Channel) -> bool {
        self.exchanges.contains(&channel.exchange)
            && self.queues.contains(channel.queue())
            && self.bindings.contains(&binding_for(channel).key())
    }

    async fn ensure(&self, channel: &Channel) -> bool {
        let exchange_ok = self.ensure_exchange(&channel.exchange).await;
        let queue_ok = self.ensure_queue(channel.queue()).await;

        if !(exchange_ok && queue_ok) {
            warn!(
                channel = %channel.name,
                exchange_ok,
                queue_ok,
                "Skipping binding, prerequisites missing"
            );
            return false;
        }

        self.ensure_binding(&binding_for(channel)).await
    }

    async fn ensure_exchange(&self, name: &str) -> bool {
        if self.exchanges.contains(name) {
            return true;
        }
        match self.broker.declare_exchange(&ExchangeSpec::durable_topic(name)).await {
            Ok(()) => {
                self.exchanges.insert(name.to_string());
                info!(exchange = name, "Exchange ensured");
                true
            }
            Err(e) => {
                error!(exchange = name, error = %e, "Failed to declare exchange");
                false
            }
        }
    }

    async fn ensure_queue(&self, name: &str) -> bool {
        if self.queues.contains(name) {
            return true;
        }
        match self.broker.declare_queue(&QueueSpec::durable(name)).await {
            Ok(()) => {
                self.queues.insert(name.to_string());
                info!(queue = name, "Queue ensured");
                true
            }
            Err(e) => {
                error!(queue = name, error = %e, "Failed to declare queue");
                false
            }
        }
    }

    async fn ensure_binding(&self, spec: &BindingSpec) -> bool {
        let key = spec.key();
        if self.bindings.contains(&key) {
            return true;
        }
        match self.broker.declare_binding(spec).await {
            Ok(()) => {
                self.bindings.insert(key);
                info!(
                    exchange = %spec.exchange,
                    queue = %spec.queue,
                    routing_key = %spec.routing_key,
                    "Binding ensured"
                );
                true
            }
            Err(e) => {
                error!(binding = %key, error = %e, "Failed to declare binding");
                false
            }
        }
    }

    async fn validate(&self, channel: &Channel) -> bool {
        let exchange_ok = self.exchange_present(&channel.exchange).await;
        let queue_ok = self.queue_present(channel.queue()).await;

        if exchange_ok && queue_ok {
            // A binding cannot be probed passively; both ends existing is taken as enough.
            self.bindings.insert(binding_for(channel).key());
            debug!(channel = %channel.name, "Channel infrastructure validated");
            true
        } else {
            warn!(
                channel = %channel.name,
                exchange_ok,
                queue_ok,
                "Channel infrastructure missing"
            );
            false
        }
    }

    async fn exchange_present(&self, name: &str) -> bool {
        if self.exchanges.contains(name) {
            return true;
        }
        match self.broker.exchange_exists(name).await {
            Ok(true) => {
                self.exchanges.insert(name.to_string());
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(exchange = name, error = %e, "Exchange probe failed");
                false
            }
        }
    }

    async fn queue_present(&self, name: &str) -> bool {
        if self.queues.contains(name) {
            return true;
        }
        match self.broker.queue_exists(name).await {
            Ok(true) => {
                self.queues.insert(name.to_string());
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(queue = name, error = %e, "Queue probe failed");
                false
            }
        }
    }
}

fn binding_for(channel: &Channel) -> BindingSpec {
    BindingSpec::new(&channel.exchange, channel.queue(), &channel.routing_key)
}

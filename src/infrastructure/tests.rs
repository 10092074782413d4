use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::{InfrastructureInitializer, InfrastructureReconciler, ReconcileMode};
use crate::broker::{Broker, ExchangeSpec, QueueSpec};
use crate::channels::{Channel, ChannelRegistry};
use crate::config::{BindingConfig, ExchangeConfig, InfrastructureSettings, QueueConfig};
use crate::testing::RecordingBroker;

fn payments_channel() -> Channel {
    Channel::new(
        "payments.order.created",
        "acme.x.payments",
        "payments.order.created",
    )
}

fn reconciler(
    mode: ReconcileMode,
    broker: Arc<RecordingBroker>,
) -> (InfrastructureReconciler, Arc<ChannelRegistry>) {
    let registry = Arc::new(ChannelRegistry::with_channels([payments_channel()]));
    (
        InfrastructureReconciler::new(mode, broker, registry.clone()),
        registry,
    )
}

#[test]
fn test_mode_parsing() {
    assert_eq!(ReconcileMode::parse("ensure"), Some(ReconcileMode::Ensure));
    assert_eq!(ReconcileMode::parse("VALIDATE"), Some(ReconcileMode::Validate));
    assert_eq!(ReconcileMode::parse("create"), None);
}

#[tokio::test]
async fn test_ensure_declares_each_object_once() {
    let broker = Arc::new(RecordingBroker::new());
    let (reconciler, _registry) = reconciler(ReconcileMode::Ensure, broker.clone());
    let channel = payments_channel();

    assert!(reconciler.reconcile(&channel).await);
    assert!(reconciler.reconcile(&channel).await);

    assert_eq!(RecordingBroker::count(&broker.exchange_declares), 1);
    assert_eq!(RecordingBroker::count(&broker.queue_declares), 1);
    assert_eq!(RecordingBroker::count(&broker.binding_declares), 1);
    assert!(broker.inner.is_bound(
        "acme.x.payments",
        "payments.order.created",
        "payments.order.created"
    ));
    assert!(reconciler.is_ready("payments.order.created"));
}

#[tokio::test]
async fn test_ensure_skips_binding_when_exchange_fails() {
    let broker = Arc::new(RecordingBroker::failing_exchanges());
    let (reconciler, _registry) = reconciler(ReconcileMode::Ensure, broker.clone());
    let channel = payments_channel();

    assert!(!reconciler.reconcile(&channel).await);
    assert_eq!(RecordingBroker::count(&broker.binding_declares), 0);
    assert!(!reconciler.is_ready(&channel.name));

    // Nothing was remembered, so the next call tries the exchange again.
    broker.fail_exchanges.store(false, Ordering::SeqCst);
    assert!(reconciler.reconcile(&channel).await);
    assert_eq!(RecordingBroker::count(&broker.exchange_declares), 2);
    assert_eq!(RecordingBroker::count(&broker.queue_declares), 1);
    assert_eq!(RecordingBroker::count(&broker.binding_declares), 1);
}

#[tokio::test]
async fn test_validate_never_declares() {
    let broker = Arc::new(RecordingBroker::new());
    let (reconciler, _registry) = reconciler(ReconcileMode::Validate, broker.clone());
    let channel = payments_channel();

    assert!(!reconciler.reconcile(&channel).await);
    assert_eq!(RecordingBroker::count(&broker.exchange_declares), 0);
    assert_eq!(RecordingBroker::count(&broker.queue_declares), 0);
    assert!(!reconciler.is_ready(&channel.name));
}

#[tokio::test]
async fn test_validate_picks_up_infrastructure_created_later() {
    let broker = Arc::new(RecordingBroker::new());
    let (reconciler, _registry) = reconciler(ReconcileMode::Validate, broker.clone());
    let channel = payments_channel();

    assert!(!reconciler.reconcile(&channel).await);

    broker
        .inner
        .declare_exchange(&ExchangeSpec::durable_topic("acme.x.payments"))
        .await
        .unwrap();
    broker
        .inner
        .declare_queue(&QueueSpec::durable("payments.order.created"))
        .await
        .unwrap();

    assert!(reconciler.reconcile(&channel).await);
    assert!(reconciler.is_ready(&channel.name));

    let probes = RecordingBroker::count(&broker.exists_probes);
    assert!(reconciler.reconcile(&channel).await);
    assert_eq!(RecordingBroker::count(&broker.exists_probes), probes);
}

#[tokio::test]
async fn test_reconcile_named_and_all() {
    let broker = Arc::new(RecordingBroker::new());
    let (reconciler, registry) = reconciler(ReconcileMode::Ensure, broker.clone());
    registry.add(Channel::new("users.profile.updated", "acme.x.users", "users.profile.updated"));

    assert!(!reconciler.reconcile_named("unknown.channel").await);

    let report = reconciler.reconcile_all().await;
    assert_eq!(report.reconciled, 2);
    assert_eq!(report.total, 2);
    assert!(reconciler.reconcile_named("users.profile.updated").await);
    assert_eq!(RecordingBroker::count(&broker.exchange_declares), 2);
}

#[tokio::test]
async fn test_channel_status_reports_readiness() {
    let broker = Arc::new(RecordingBroker::new());
    let (reconciler, _registry) = reconciler(ReconcileMode::Ensure, broker);

    let before = reconciler.channel_status("payments.order.created").unwrap();
    assert!(!before.infrastructure_ready);
    assert_eq!(before.exchange, "acme.x.payments");

    reconciler.reconcile_named("payments.order.created").await;
    let channels = reconciler.list_channels();
    assert_eq!(channels.len(), 1);
    assert!(channels[0].infrastructure_ready);
    assert!(reconciler.channel_status("missing.channel").is_none());
}

fn static_settings() -> InfrastructureSettings {
    InfrastructureSettings {
        exchanges: vec![
            ExchangeConfig {
                name: "acme.x.audit".to_string(),
                kind: "fanout".to_string(),
                durable: true,
                auto_delete: false,
            },
            ExchangeConfig {
                name: "acme.x.odd".to_string(),
                kind: "headers-ish".to_string(),
                durable: true,
                auto_delete: false,
            },
        ],
        queues: vec![QueueConfig {
            name: "audit.all".to_string(),
            durable: true,
            auto_delete: false,
        }],
        bindings: vec![
            BindingConfig {
                exchange: "acme.x.audit".to_string(),
                queue: "audit.all".to_string(),
                routing_key: "#".to_string(),
            },
            BindingConfig {
                exchange: "acme.x.missing".to_string(),
                queue: "audit.all".to_string(),
                routing_key: "#".to_string(),
            },
        ],
    }
}

#[tokio::test]
async fn test_initializer_declares_configured_objects() {
    let broker = Arc::new(RecordingBroker::new());
    let initializer = InfrastructureInitializer::new(broker.clone(), static_settings());

    let status = initializer.run().await;
    assert_eq!(status.total_exchanges, 2);
    assert_eq!(status.created_exchanges, 2);
    assert_eq!(status.created_queues, 1);
    assert_eq!(status.total_bindings, 2);
    assert_eq!(status.created_bindings, 1);
    assert!(!status.is_complete());

    // The unknown type fell back to topic.
    assert!(broker.inner.exchange_exists("acme.x.odd").await.unwrap());
    assert!(broker.inner.is_bound("acme.x.audit", "audit.all", "#"));
    // The binding to an exchange it never created was not attempted.
    assert_eq!(RecordingBroker::count(&broker.binding_declares), 1);
}

#[tokio::test]
async fn test_initializer_rerun_skips_created_items() {
    let broker = Arc::new(RecordingBroker::new());
    let initializer = InfrastructureInitializer::new(broker.clone(), static_settings());

    initializer.run().await;
    initializer.run().await;
    assert_eq!(RecordingBroker::count(&broker.exchange_declares), 2);
    assert_eq!(RecordingBroker::count(&broker.queue_declares), 1);
    assert_eq!(RecordingBroker::count(&broker.binding_declares), 1);
}

#[tokio::test]
async fn test_initializer_records_failures() {
    let broker = Arc::new(RecordingBroker::failing_exchanges());
    let initializer = InfrastructureInitializer::new(broker.clone(), static_settings());

    let status = initializer.run().await;
    assert_eq!(status.created_exchanges, 0);
    assert_eq!(status.created_queues, 1);
    assert_eq!(status.created_bindings, 0);
    assert_eq!(RecordingBroker::count(&broker.binding_declares), 0);
}

#[tokio::test]
async fn test_initializer_without_configuration_is_complete() {
    let broker = Arc::new(RecordingBroker::new());
    let initializer = InfrastructureInitializer::new(broker, InfrastructureSettings::default());
    assert!(initializer.run().await.is_complete());
}

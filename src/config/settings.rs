use serde::Deserialize;

use crate::channels::Channel;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub persistence: PersistenceSettings,
    pub webhook: WebhookSettings,
    pub logging: LoggingSettings,
    /// Channels known at startup.
    pub channels: Vec<Channel>,
    /// Exchanges, queues and bindings declared once by the bulk initializer.
    pub infrastructure: InfrastructureSettings,
}

/// Configuration settings for the command server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broker side.
///
/// `org_prefix` names dynamically derived exchanges (`<prefix>.x.<squad>`),
/// `reconcile_mode` is either `ensure` or `validate`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    pub org_prefix: String,
    pub reconcile_mode: String,
    pub consumer_poll_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PersistenceSettings {
    pub path: String,
}

/// Outbound webhook calls: timeouts and the retry budget per subscriber.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WebhookSettings {
    pub connect_timeout_ms: u64,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct InfrastructureSettings {
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
    #[serde(default)]
    pub queues: Vec<QueueConfig>,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

impl InfrastructureSettings {
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty() && self.queues.is_empty() && self.bindings.is_empty()
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExchangeConfig {
    pub name: String,
    /// `topic`, `direct` or `fanout`.
    #[serde(rename = "type", alias = "kind", default = "default_exchange_kind")]
    pub kind: String,
    #[serde(default = "default_true")]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct QueueConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BindingConfig {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
}

fn default_exchange_kind() -> String {
    "topic".to_string()
}

fn default_true() -> bool {
    true
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; `Settings::merge` fills the gaps from the defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub persistence: Option<PartialPersistenceSettings>,
    pub webhook: Option<PartialWebhookSettings>,
    pub logging: Option<PartialLoggingSettings>,
    pub channels: Option<Vec<Channel>>,
    pub infrastructure: Option<InfrastructureSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub org_prefix: Option<String>,
    pub reconcile_mode: Option<String>,
    pub consumer_poll_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialPersistenceSettings {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialWebhookSettings {
    pub connect_timeout_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            broker: BrokerSettings {
                org_prefix: "hookhub".to_string(),
                reconcile_mode: "ensure".to_string(),
                consumer_poll_ms: 1000,
            },
            persistence: PersistenceSettings {
                path: "data/hookhub".to_string(),
            },
            webhook: WebhookSettings {
                connect_timeout_ms: 5_000,
                timeout_ms: 10_000,
                max_attempts: 3,
                backoff_ms: 300,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            channels: Vec::new(),
            infrastructure: InfrastructureSettings::default(),
        }
    }
}

impl Settings {
    /// Fills every field missing from `partial` with its default.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();

        let server = match partial.server {
            Some(s) => ServerSettings {
                host: s.host.unwrap_or(default.server.host),
                port: s.port.unwrap_or(default.server.port),
            },
            None => default.server,
        };

        let broker = match partial.broker {
            Some(b) => BrokerSettings {
                org_prefix: b.org_prefix.unwrap_or(default.broker.org_prefix),
                reconcile_mode: b.reconcile_mode.unwrap_or(default.broker.reconcile_mode),
                consumer_poll_ms: b.consumer_poll_ms.unwrap_or(default.broker.consumer_poll_ms),
            },
            None => default.broker,
        };

        let persistence = match partial.persistence {
            Some(p) => PersistenceSettings {
                path: p.path.unwrap_or(default.persistence.path),
            },
            None => default.persistence,
        };

        let webhook = match partial.webhook {
            Some(w) => WebhookSettings {
                connect_timeout_ms: w
                    .connect_timeout_ms
                    .unwrap_or(default.webhook.connect_timeout_ms),
                timeout_ms: w.timeout_ms.unwrap_or(default.webhook.timeout_ms),
                max_attempts: w.max_attempts.unwrap_or(default.webhook.max_attempts),
                backoff_ms: w.backoff_ms.unwrap_or(default.webhook.backoff_ms),
            },
            None => default.webhook,
        };

        let logging = match partial.logging {
            Some(l) => LoggingSettings {
                level: l.level.unwrap_or(default.logging.level),
            },
            None => default.logging,
        };

        Settings {
            server,
            broker,
            persistence,
            webhook,
            logging,
            channels: partial.channels.unwrap_or(default.channels),
            infrastructure: partial.infrastructure.unwrap_or(default.infrastructure),
        }
    }
}

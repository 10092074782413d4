//! Error types used across `hookhub`.
//!
//! The taxonomy separates client errors (malformed envelopes, bad patterns,
//! underivable channel names, duplicate subscriptions) from infrastructure,
//! storage and delivery failures. Service-level unions expose
//! `is_client_error` so the command surface can map them to a response kind.

use thiserror::Error;

/// A channel name could not be resolved or derived.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel name must follow pattern squad.topic.event (got '{0}')")]
    InvalidName(String),

    #[error("failed to create or find channel: {0}")]
    Unresolvable(String),
}

/// A subscription pattern was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("'#' may only appear at the start or the end of a pattern: '{0}'")]
    MisplacedHash(String),

    #[error("pattern '{pattern}' could not be compiled: {reason}")]
    Compile { pattern: String, reason: String },
}

/// Structural problems with an inbound envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("{0} must not be blank")]
    Blank(&'static str),

    #[error("payload must not be null")]
    NullPayload,
}

/// A subscription request failed field validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} {reason}")]
    Field { field: &'static str, reason: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl ValidationError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Field {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures reported by the broker boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("exchange '{0}' not found")]
    ExchangeNotFound(String),

    #[error("queue '{0}' not found")]
    QueueNotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("broker unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the row store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to encode or decode record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("a subscription with the same webhook URL and topic already exists")]
    DuplicateSubscription,
}

/// A single webhook delivery attempt failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Transport(String),

    #[error("webhook responded with status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => DeliveryError::Status(status.as_u16()),
            None => DeliveryError::Transport(e.to_string()),
        }
    }
}

/// Errors surfaced by the publish pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("cannot resolve channel: {0}")]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to publish message: {0}")]
    Broker(#[from] BrokerError),
}

impl PublishError {
    /// True for errors caused by the request itself rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PublishError::Envelope(_) | PublishError::Channel(_))
    }
}

/// Errors surfaced by subscription management.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("invalid subscription: {0}")]
    Validation(#[from] ValidationError),

    #[error("a subscription with the same webhook URL and topic already exists")]
    Duplicate,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SubscriptionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateSubscription => SubscriptionError::Duplicate,
            other => SubscriptionError::Store(other),
        }
    }
}

impl SubscriptionError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SubscriptionError::Validation(_) | SubscriptionError::Duplicate
        )
    }
}

/// Errors that stop the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("unknown reconcile mode '{0}', expected 'ensure' or 'validate'")]
    ReconcileMode(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("webhook client error: {0}")]
    Webhook(#[from] DeliveryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

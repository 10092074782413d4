//! The `model` module holds the values that flow through `hookhub`.
//!
//! - `envelope`: the wire envelope publishers submit and webhooks receive.
//! - `records`: the persisted rows (message log, payload, subscription) and
//!   the summaries built from them.

pub mod envelope;
pub mod records;

pub use envelope::{Destination, MessageEnvelope, Payload};
pub use records::{
    MessageLogEntry, MessageStatus, PayloadRecord, Subscription, SubscriptionList,
    SubscriptionRequest, SubscriptionStatus, SubscriptionSummary,
};

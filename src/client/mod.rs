//! The `client` module is the outbound side of hookhub: it delivers messages
//! to subscriber webhooks.
//!
//! [`WebhookClient`] is the seam the dispatch engine calls through;
//! [`HttpWebhookClient`] is the reqwest-backed implementation.

pub mod webhook;

pub use webhook::{
    CORRELATION_ID_HEADER, HttpWebhookClient, SUBSCRIPTION_ID_HEADER, WebhookClient,
    WebhookRequest,
};

#[cfg(test)]
mod tests;

//! The `subscription` module manages webhook subscriptions.
//!
//! [`SubscriptionService`] validates and stores subscription requests,
//! answers the management queries, finds the subscriptions matching a
//! delivered message, and keeps the per-subscriber delivery health fields up
//! to date.

pub mod service;
pub mod validation;

pub use service::SubscriptionService;

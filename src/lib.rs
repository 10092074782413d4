//! # hookhub
//!
//! `hookhub` bridges a topic-based message broker and HTTP webhooks.
//! Producers publish envelopes to named channels; every message is logged
//! once per message id, routed through the channel's exchange, and delivered
//! to the webhooks of all subscriptions whose topic and event patterns match.
//!
//! ## Core Modules
//!
//! - `pattern`: wildcard matching for subscription topics and events.
//! - `channels`: the registry of channels and their dynamic derivation.
//! - `broker`: the broker boundary and the in-process topic broker.
//! - `infrastructure`: per-channel reconciliation and the bulk initializer.
//! - `publish`: the idempotent publish pipeline.
//! - `subscription`: subscription validation, storage and matching.
//! - `dispatch`: consumers, webhook fan-out and retries.
//! - `client`: the outbound webhook HTTP client.
//! - `persistence`: sled-backed message log, payload and subscription stores.
//! - `transport`: the WebSocket command surface.
//! - `config`: loading and merging configuration.
//! - `app`: wiring the components together.
//! - `utils`: error types and logging.

pub mod app;
pub mod broker;
pub mod channels;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod infrastructure;
pub mod model;
pub mod pattern;
pub mod persistence;
pub mod publish;
pub mod subscription;
pub mod transport;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

//! The `channels` module maps logical channel names to broker destinations.
//!
//! A channel is either declared in configuration or derived on first use from
//! a `squad.topic.event` name. The registry is append-only for the lifetime of
//! the process and safe to share between concurrent publish and dispatch tasks.

pub mod registry;

pub use registry::{Channel, ChannelRegistry, derive_channel};

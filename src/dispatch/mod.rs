//! The `dispatch` module delivers consumed messages to the webhooks of
//! matching subscriptions.
//!
//! - `consumer`: attaches to channel queues and spawns a task per delivery
//! - `engine`: finds the matching subscriptions and fans the message out
//! - `retry`: the per-subscriber retry budget and linear backoff

pub mod consumer;
pub mod engine;
pub mod retry;

pub use consumer::DispatchConsumer;
pub use engine::{DispatchEngine, DispatchReport};
pub use retry::RetryPolicy;

//! The `publish` module accepts envelopes from producers and hands them to
//! the broker exactly once per message id.

pub mod pipeline;

pub use pipeline::{PublishOutcome, PublishPipeline};

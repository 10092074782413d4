//! The `infrastructure` module makes sure the broker objects behind each
//! channel exist before messages are published to them.
//!
//! [`InfrastructureReconciler`] works per channel and remembers what it has
//! already seen, so repeated publishes to the same channel cost nothing.
//! [`InfrastructureInitializer`] declares the statically configured
//! exchanges, queues and bindings once at startup.

pub mod initializer;
pub mod reconciler;

use serde::{Deserialize, Serialize};

pub use initializer::InfrastructureInitializer;
pub use reconciler::{InfrastructureReconciler, ReconcileMode, ReconcileReport};

/// Snapshot of what the bulk initializer managed to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    pub total_exchanges: usize,
    pub created_exchanges: usize,
    pub total_queues: usize,
    pub created_queues: usize,
    pub total_bindings: usize,
    pub created_bindings: usize,
}

impl InfrastructureStatus {
    pub fn is_complete(&self) -> bool {
        self.created_exchanges == self.total_exchanges
            && self.created_queues == self.total_queues
            && self.created_bindings == self.total_bindings
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    pub channel_name: String,
    pub exchange: String,
    pub routing_key: String,
    pub infrastructure_ready: bool,
}

#[cfg(test)]
mod tests;

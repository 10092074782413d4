use std::collections::BTreeMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::utils::error::ChannelError;

/// A logical publish destination and the broker exchange/routing key it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub name: String,
    pub exchange: String,
    #[serde(alias = "routing_key", alias = "routingkey")]
    pub routing_key: String,
}

impl Channel {
    pub fn new(name: &str, exchange: &str, routing_key: &str) -> Self {
        Self {
            name: name.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        }
    }

    /// Each channel gets its own queue, named after the channel.
    pub fn queue(&self) -> &str {
        &self.name
    }
}

/// Derives a channel from a `squad.topic.event` style name.
///
/// The first segment selects the squad exchange `<prefix>.x.<squad>` and the
/// full name becomes the routing key, so it must not contain the broker's
/// `*` or `#` wildcards.
pub fn derive_channel(name: &str, org_prefix: &str) -> Result<Channel, ChannelError> {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2
        || segments.iter().any(|s| s.trim().is_empty())
        || name.contains(['*', '#'])
    {
        return Err(ChannelError::InvalidName(name.to_string()));
    }
    let exchange = format!("{org_prefix}.x.{}", segments[0]);
    Ok(Channel::new(name, &exchange, name))
}

/// Concurrent, append-only registry of channels keyed by name.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: DashMap<String, Channel>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from statically configured channels. Later
    /// duplicates of a name are ignored.
    pub fn with_channels(channels: impl IntoIterator<Item = Channel>) -> Self {
        let registry = Self::new();
        for channel in channels {
            registry.add(channel);
        }
        info!(channels = registry.len(), "Channel registry initialized");
        registry
    }

    pub fn find(&self, name: &str) -> Option<Channel> {
        self.channels.get(name).map(|c| c.value().clone())
    }

    /// A point-in-time copy, sorted by channel name.
    pub fn all(&self) -> BTreeMap<String, Channel> {
        self.channels
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Inserts the channel unless the name is taken. Returns whether this call
    /// inserted it; an existing channel is never overwritten.
    pub fn add(&self, channel: Channel) -> bool {
        match self.channels.entry(channel.name.clone()) {
            Entry::Occupied(_) => {
                warn!(channel = %channel.name, "Channel already exists, not adding");
                false
            }
            Entry::Vacant(slot) => {
                info!(
                    channel = %channel.name,
                    exchange = %channel.exchange,
                    routing_key = %channel.routing_key,
                    "Added channel"
                );
                slot.insert(channel);
                true
            }
        }
    }

    /// Finds the channel, deriving and registering it when it is unknown.
    /// When another task registers the same name first, its channel is used.
    pub fn resolve_or_create(&self, name: &str, org_prefix: &str) -> Result<Channel, ChannelError> {
        if let Some(channel) = self.find(name) {
            return Ok(channel);
        }

        let derived = derive_channel(name, org_prefix)?;
        if self.add(derived.clone()) {
            info!(channel = name, exchange = %derived.exchange, "Created channel dynamically");
            return Ok(derived);
        }

        self.find(name)
            .ok_or_else(|| ChannelError::Unresolvable(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

use serde::{Deserialize, Serialize};

use crate::infrastructure::{ChannelStatus, InfrastructureStatus, ReconcileReport};
use crate::model::{
    MessageEnvelope, Subscription, SubscriptionList, SubscriptionRequest, SubscriptionStatus,
};
use crate::publish::PublishOutcome;

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Publish {
        envelope: MessageEnvelope,
        #[serde(default)]
        correlation_id: Option<String>,
    },
    CreateSubscription {
        subscription: SubscriptionRequest,
    },
    GetSubscription {
        id: String,
    },
    ListSubscriptions,
    ListSquadSubscriptions {
        squad_name: String,
    },
    UpdateSubscriptionStatus {
        id: String,
        status: SubscriptionStatus,
    },
    DeleteSubscription {
        id: String,
    },
    CountActiveSubscriptions {
        squad_name: String,
    },
    SubscriptionSummary,
    ChannelStatus {
        channel: String,
    },
    ListChannels,
    EnsureChannel {
        channel: String,
    },
    ReconcileChannels,
    InitializeInfrastructure,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Accepted {
        message_id: String,
        outcome: PublishOutcome,
    },
    BadRequest {
        message: String,
    },
    NotFound {
        message: String,
    },
    ServerError {
        message: String,
    },
    Subscription {
        subscription: Subscription,
    },
    Subscriptions {
        subscriptions: Vec<Subscription>,
    },
    StatusUpdated {
        id: String,
        status: SubscriptionStatus,
    },
    Deleted {
        id: String,
    },
    Count {
        squad_name: String,
        count: usize,
    },
    Summary {
        summary: SubscriptionList,
    },
    Channel {
        status: ChannelStatus,
    },
    Channels {
        channels: Vec<ChannelStatus>,
    },
    ChannelEnsured {
        channel: String,
        ready: bool,
    },
    Reconciled {
        report: ReconcileReport,
    },
    Infrastructure {
        status: InfrastructureStatus,
    },
}

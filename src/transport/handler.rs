use tracing::{error, warn};

use crate::app::App;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::{PublishError, StoreError, SubscriptionError};

/// Parses one text frame and answers it.
pub async fn handle_text(app: &App, text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => handle(app, message).await,
        Err(e) => {
            warn!(error = %e, "Invalid client message");
            ServerMessage::BadRequest {
                message: format!("invalid message: {e}"),
            }
        }
    }
}

pub async fn handle(app: &App, message: ClientMessage) -> ServerMessage {
    match message {
        ClientMessage::Publish {
            envelope,
            correlation_id,
        } => match app
            .publisher
            .publish(&envelope, correlation_id.as_deref())
            .await
        {
            Ok(outcome) => ServerMessage::Accepted {
                message_id: envelope.message_id,
                outcome,
            },
            Err(e) => publish_error(e),
        },

        ClientMessage::CreateSubscription { subscription } => {
            match app.subscriptions.create(subscription) {
                Ok(subscription) => ServerMessage::Subscription { subscription },
                Err(e) => subscription_error(e),
            }
        }

        ClientMessage::GetSubscription { id } => match app.subscriptions.find_by_id(&id) {
            Ok(Some(subscription)) => ServerMessage::Subscription { subscription },
            Ok(None) => not_found(format!("subscription '{id}' not found")),
            Err(e) => store_error(e),
        },

        ClientMessage::ListSubscriptions => match app.subscriptions.find_active() {
            Ok(subscriptions) => ServerMessage::Subscriptions { subscriptions },
            Err(e) => store_error(e),
        },

        ClientMessage::ListSquadSubscriptions { squad_name } => {
            match app.subscriptions.find_by_squad(&squad_name) {
                Ok(subscriptions) => ServerMessage::Subscriptions { subscriptions },
                Err(e) => store_error(e),
            }
        }

        ClientMessage::UpdateSubscriptionStatus { id, status } => {
            match app.subscriptions.update_status(&id, status) {
                Ok(true) => ServerMessage::StatusUpdated { id, status },
                Ok(false) => not_found(format!("subscription '{id}' not found")),
                Err(e) => store_error(e),
            }
        }

        ClientMessage::DeleteSubscription { id } => match app.subscriptions.delete(&id) {
            Ok(true) => ServerMessage::Deleted { id },
            Ok(false) => not_found(format!("subscription '{id}' not found")),
            Err(e) => store_error(e),
        },

        ClientMessage::CountActiveSubscriptions { squad_name } => {
            match app.subscriptions.count_active_by_squad(&squad_name) {
                Ok(count) => ServerMessage::Count { squad_name, count },
                Err(e) => store_error(e),
            }
        }

        ClientMessage::SubscriptionSummary => match app.subscriptions.list_summary() {
            Ok(summary) => ServerMessage::Summary { summary },
            Err(e) => store_error(e),
        },

        ClientMessage::ChannelStatus { channel } => match app.reconciler.channel_status(&channel) {
            Some(status) => ServerMessage::Channel { status },
            None => not_found(format!("channel '{channel}' not found")),
        },

        ClientMessage::ListChannels => ServerMessage::Channels {
            channels: app.reconciler.list_channels(),
        },

        ClientMessage::EnsureChannel { channel } => {
            if app.registry.find(&channel).is_none() {
                return not_found(format!("channel '{channel}' not found"));
            }
            let ready = app.reconciler.reconcile_named(&channel).await;
            app.consumer.attach_all().await;
            ServerMessage::ChannelEnsured { channel, ready }
        }

        ClientMessage::ReconcileChannels => {
            let report = app.reconciler.reconcile_all().await;
            app.consumer.attach_all().await;
            ServerMessage::Reconciled { report }
        }

        ClientMessage::InitializeInfrastructure => ServerMessage::Infrastructure {
            status: app.initializer.run().await,
        },
    }
}

fn not_found(message: String) -> ServerMessage {
    ServerMessage::NotFound { message }
}

fn store_error(e: StoreError) -> ServerMessage {
    error!(error = %e, "Storage failure");
    ServerMessage::ServerError {
        message: e.to_string(),
    }
}

fn publish_error(e: PublishError) -> ServerMessage {
    match e {
        PublishError::Envelope(_) => ServerMessage::BadRequest {
            message: e.to_string(),
        },
        PublishError::Channel(_) => not_found(e.to_string()),
        other => {
            error!(error = %other, "Publish failed");
            ServerMessage::ServerError {
                message: other.to_string(),
            }
        }
    }
}

fn subscription_error(e: SubscriptionError) -> ServerMessage {
    if e.is_client_error() {
        return ServerMessage::BadRequest {
            message: e.to_string(),
        };
    }
    error!(error = %e, "Subscription failure");
    ServerMessage::ServerError {
        message: e.to_string(),
    }
}

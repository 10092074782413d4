use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use tracing::{debug, warn};

use crate::config::WebhookSettings;
use crate::model::MessageEnvelope;
use crate::utils::error::DeliveryError;

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";
pub const SUBSCRIPTION_ID_HEADER: &str = "X-Subscription-Id";

/// One webhook call: the envelope is the JSON body, the ids travel as headers.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub envelope: MessageEnvelope,
    pub correlation_id: Option<String>,
    pub subscription_id: String,
}

#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// Performs a single delivery attempt. Any non-error status is a success.
    async fn deliver(&self, url: &str, request: &WebhookRequest) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct HttpWebhookClient {
    client: reqwest::Client,
}

impl HttpWebhookClient {
    /// Builds the HTTP client with the configured connect and overall timeouts.
    pub fn new(settings: &WebhookSettings) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| DeliveryError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn deliver(&self, url: &str, request: &WebhookRequest) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, correlation_header(request))
            .header(SUBSCRIPTION_ID_HEADER, &request.subscription_id)
            .json(&request.envelope)
            .send()
            .await?
            .error_for_status()?;

        debug!(
            url,
            status = response.status().as_u16(),
            subscription_id = %request.subscription_id,
            "Webhook accepted delivery"
        );
        Ok(())
    }
}

/// The correlation id comes from the publisher; one that is not a legal
/// header value is sent empty instead of failing the delivery.
fn correlation_header(request: &WebhookRequest) -> HeaderValue {
    let raw = request.correlation_id.as_deref().unwrap_or_default();
    HeaderValue::from_str(raw).unwrap_or_else(|e| {
        warn!(
            subscription_id = %request.subscription_id,
            error = %e,
            "Correlation id is not a valid header value, sending it empty"
        );
        HeaderValue::from_static("")
    })
}

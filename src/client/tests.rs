use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{HttpWebhookClient, WebhookClient, WebhookRequest};
use crate::config::WebhookSettings;
use crate::model::MessageEnvelope;
use crate::utils::error::DeliveryError;

fn settings() -> WebhookSettings {
    WebhookSettings {
        connect_timeout_ms: 1_000,
        timeout_ms: 2_000,
        max_attempts: 3,
        backoff_ms: 1,
    }
}

fn envelope() -> MessageEnvelope {
    serde_json::from_value(serde_json::json!({
        "messageId": "msg-1",
        "timestamp": "2024-05-01T10:00:00Z",
        "source": "checkout",
        "destination": { "channel": "payments.order.created", "eventName": "orderCreated" },
        "payload": { "orderId": 42 }
    }))
    .unwrap()
}

fn request(correlation_id: Option<&str>) -> WebhookRequest {
    WebhookRequest {
        envelope: envelope(),
        correlation_id: correlation_id.map(str::to_string),
        subscription_id: "sub-1".to_string(),
    }
}

#[tokio::test]
async fn test_posts_envelope_with_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("X-Correlation-Id", "corr-9"))
        .and(header("X-Subscription-Id", "sub-1"))
        .and(body_json(serde_json::to_value(envelope()).unwrap()))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpWebhookClient::new(&settings()).unwrap();
    let url = format!("{}/hook", server.uri());
    client.deliver(&url, &request(Some("corr-9"))).await.unwrap();
}

#[tokio::test]
async fn test_missing_correlation_id_is_sent_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Correlation-Id", ""))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpWebhookClient::new(&settings()).unwrap();
    client.deliver(&server.uri(), &request(None)).await.unwrap();
}

#[tokio::test]
async fn test_illegal_correlation_id_does_not_fail_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-Correlation-Id", ""))
        .and(header("X-Subscription-Id", "sub-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpWebhookClient::new(&settings()).unwrap();
    client
        .deliver(&server.uri(), &request(Some("corr\nid")))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpWebhookClient::new(&settings()).unwrap();
    let err = client.deliver(&server.uri(), &request(None)).await.unwrap_err();
    assert!(matches!(err, DeliveryError::Status(503)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_error() {
    let client = HttpWebhookClient::new(&settings()).unwrap();
    let err = client
        .deliver("http://127.0.0.1:9/hook", &request(None))
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Transport(_)));
}

//! End-to-end delivery tests against a mock HTTP destination.
//!
//! Covers:
//! - Successful first-attempt delivery and its audit row
//! - Retries exhausted on persistent 5xx responses
//! - Attempt timeouts treated as failed attempts
//! - Wire headers, signature, and delivery id stability

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roleready_webhooks::{
    DestinationConfig, EventDispatcher, HttpDeliveryExecutor, InMemoryWebhookStorage, WebhookConfig,
    WebhookEvent, WebhookReceiver, WebhookStorage,
};

// =============================================================================
// Test Helpers
// =============================================================================

const SECRET: &str = "integration-secret";

fn fast_config() -> WebhookConfig {
    WebhookConfig::new()
        .max_attempts(3)
        .retry_delays([Duration::from_millis(20), Duration::from_millis(40), Duration::from_millis(60)])
        .timeout(Duration::from_millis(200))
}

async fn setup(server: &MockServer, config: &WebhookConfig) -> (Arc<InMemoryWebhookStorage>, EventDispatcher) {
    let storage = Arc::new(InMemoryWebhookStorage::new());
    let destination = DestinationConfig::new("user-1", format!("{}/hook", server.uri()))
        .secret(SECRET)
        .events([WebhookEvent::ResumeParsed.as_str()]);
    storage.save_destination(&destination).await.unwrap();

    let executor = Arc::new(HttpDeliveryExecutor::new(&config.user_agent));
    let dispatcher = EventDispatcher::from_config(storage.clone(), executor, config);
    (storage, dispatcher)
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_first_attempt_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, dispatcher) = setup(&server, &fast_config()).await;

    let outcome = dispatcher
        .resume_parsed("user-1", "resume-1", "cv.pdf", json!({"skills": ["rust"]}))
        .await
        .unwrap()
        .expect("destination is configured");

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.error, None);

    let rows = storage.all_logs().await;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].success);
    assert_eq!(rows[0].delivery_id, outcome.delivery_id);
    assert!(rows[0].delivered_at.is_some());
}

#[tokio::test]
async fn test_persistent_server_error_exhausts_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(3)
        .mount(&server)
        .await;

    let (storage, dispatcher) = setup(&server, &fast_config()).await;

    let start = Instant::now();
    let outcome = dispatcher
        .dispatch("user-1", "resume.parsed", json!({}))
        .await
        .unwrap()
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.status_code, Some(500));
    assert_eq!(outcome.error.as_deref(), Some("HTTP 500: Internal Server Error"));
    // Waits happen only between attempts: 20ms then 40ms.
    assert!(start.elapsed() >= Duration::from_millis(60));

    let rows = storage.all_logs().await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].success);
    assert_eq!(rows[0].attempts, 3);
}

#[tokio::test]
async fn test_timeout_is_retried_like_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let (storage, dispatcher) = setup(&server, &fast_config()).await;

    let outcome = dispatcher
        .dispatch("user-1", "resume.parsed", json!({}))
        .await
        .unwrap()
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.status_code, None);
    assert!(outcome.error.unwrap().contains("timed out"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert!(!storage.all_logs().await[0].success);
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let (_, dispatcher) = setup(&server, &fast_config()).await;

    let outcome = dispatcher
        .dispatch("user-1", "resume.parsed", json!({}))
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.status_code, Some(202));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_disabled_event_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (storage, dispatcher) = setup(&server, &fast_config()).await;

    let outcome = dispatcher
        .tailoring_failed("user-1", "t1", "r1", "j1", "model error")
        .await
        .unwrap();
    assert!(outcome.is_none());

    let outcome = dispatcher.dispatch("user-2", "resume.parsed", json!({})).await.unwrap();
    assert!(outcome.is_none());
    assert!(storage.all_logs().await.is_empty());
}

// =============================================================================
// Wire Format
// =============================================================================

#[tokio::test]
async fn test_request_headers_and_signature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Webhook-Event", "resume.parsed"))
        .and(header("User-Agent", "RoleReady-Webhook/1.0"))
        .and(header_exists("X-Webhook-Signature"))
        .and(header_exists("X-Webhook-Delivery-Id"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (_, dispatcher) = setup(&server, &fast_config()).await;
    let outcome = dispatcher
        .resume_parsed("user-1", "resume-1", "cv.pdf", json!({}))
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.success);

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let signature = request.headers.get("X-Webhook-Signature").unwrap().to_str().unwrap();
    let delivery_id = request.headers.get("X-Webhook-Delivery-Id").unwrap().to_str().unwrap();

    let envelope = WebhookReceiver::new(SECRET).unwrap().verify(signature, &request.body).unwrap();
    assert_eq!(envelope.delivery_id, delivery_id);
    assert_eq!(envelope.delivery_id, outcome.delivery_id);
    assert_eq!(envelope.event, "resume.parsed");
    assert_eq!(envelope.user_id, "user-1");
    assert_eq!(envelope.data["resumeId"], "resume-1");
    assert_eq!(envelope.data["status"], "completed");
}

#[tokio::test]
async fn test_delivery_id_shared_by_all_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (_, dispatcher) = setup(&server, &fast_config()).await;
    let outcome = dispatcher
        .dispatch("user-1", "resume.parsed", json!({}))
        .await
        .unwrap()
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        let id = request.headers.get("X-Webhook-Delivery-Id").unwrap().to_str().unwrap();
        assert_eq!(id, outcome.delivery_id);
        assert_eq!(request.body, requests[0].body);
    }
}

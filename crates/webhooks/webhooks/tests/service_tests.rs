//! Integration tests for owner-facing webhook operations.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roleready_webhooks::{
    DestinationUpdate, EventDispatcher, HttpDeliveryExecutor, InMemoryWebhookStorage, LogQuery, WebhookConfig,
    WebhookError, WebhookEvent, WebhookReceiver, WebhookService,
};

fn service() -> WebhookService {
    let config = WebhookConfig::new()
        .retry_delays([Duration::from_millis(5)])
        .timeout(Duration::from_millis(500));
    let dispatcher = EventDispatcher::from_config(
        Arc::new(InMemoryWebhookStorage::new()),
        Arc::new(HttpDeliveryExecutor::new(&config.user_agent)),
        &config,
    );
    WebhookService::new(dispatcher)
}

mod config_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_upsert_returns_secret_once() {
        let service = service();

        let created = service
            .upsert_config("user-1", DestinationUpdate::new("https://example.com/hook"))
            .await
            .unwrap();
        let secret = created.secret.expect("new destination returns its secret");
        assert_eq!(secret.len(), 64);
        assert!(created.config.enabled);
        assert_eq!(created.config.enabled_events.len(), WebhookEvent::ALL.len());

        let updated = service
            .upsert_config(
                "user-1",
                DestinationUpdate::new("https://example.com/other")
                    .enabled(false)
                    .events(["resume.parsed"]),
            )
            .await
            .unwrap();
        assert!(updated.secret.is_none());
        assert_eq!(updated.config.url, "https://example.com/other");
        assert!(!updated.config.enabled);
        assert_eq!(updated.config.enabled_events, vec!["resume.parsed".to_string()]);

        let view = service.get_config("user-1").await.unwrap().unwrap();
        assert_eq!(view, updated.config);
        assert!(!serde_json::to_string(&view).unwrap().contains(&secret));
    }

    #[tokio::test]
    async fn test_upsert_validation() {
        let service = service();

        let err = service
            .upsert_config("user-1", DestinationUpdate::new("not-a-url"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidUrl(_)));

        let err = service
            .upsert_config("user-1", DestinationUpdate::new("https://example.com").events(["user.created"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidEvents(_)));
        assert_eq!(err.status_code(), 400);

        assert!(service.get_config("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_event_list_disables_every_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let service = service();
        let saved = service
            .upsert_config("user-1", DestinationUpdate::new(server.uri()).events(Vec::<String>::new()))
            .await
            .unwrap();
        assert!(saved.config.enabled_events.is_empty());

        let outcome = service
            .dispatcher()
            .tailoring_failed("user-1", "t1", "r1", "j1", "model error")
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let service = service();
        service
            .upsert_config("user-1", DestinationUpdate::new("https://example.com/hook"))
            .await
            .unwrap();

        service.delete_config("user-1").await.unwrap();
        assert!(service.get_config("user-1").await.unwrap().is_none());

        let outcome = service
            .dispatcher()
            .dispatch("user-1", "resume.parsed", json!({}))
            .await
            .unwrap();
        assert!(outcome.is_none());

        let err = service.delete_config("user-1").await.unwrap_err();
        assert!(matches!(err, WebhookError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rotate_secret() {
        let service = service();
        let created = service
            .upsert_config(
                "user-1",
                DestinationUpdate::new("https://example.com/hook").events(["ats.check_failed"]),
            )
            .await
            .unwrap();

        let rotated = service.rotate_secret("user-1").await.unwrap();
        assert_ne!(Some(rotated), created.secret);

        let view = service.get_config("user-1").await.unwrap().unwrap();
        assert_eq!(view.url, "https://example.com/hook");
        assert_eq!(view.enabled_events, vec!["ats.check_failed".to_string()]);

        let err = service.rotate_secret("user-2").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}

mod test_delivery_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_test_uses_current_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Webhook-Event", "webhook.test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let service = service();
        service
            .upsert_config("user-1", DestinationUpdate::new(server.uri()).enabled(false))
            .await
            .unwrap();
        let secret = service.rotate_secret("user-1").await.unwrap();

        let outcome = service.send_test("user-1").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 1);

        let requests = server.received_requests().await.unwrap();
        let signature = requests[0].headers.get("X-Webhook-Signature").unwrap().to_str().unwrap();
        let envelope = WebhookReceiver::new(secret).unwrap().verify(signature, &requests[0].body).unwrap();
        assert_eq!(envelope.data["testId"], outcome.delivery_id.as_str());
        assert_eq!(envelope.data["message"], "This is a test webhook from RoleReady");

        // Test deliveries are not audited.
        let page = service.list_logs("user-1", LogQuery::default()).await.unwrap();
        assert_eq!(page.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_send_test_failure_is_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such hook"))
            .expect(1)
            .mount(&server)
            .await;

        let service = service();
        service
            .upsert_config("user-1", DestinationUpdate::new(server.uri()))
            .await
            .unwrap();

        let outcome = service.send_test("user-1").await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.status_code, Some(404));
        assert_eq!(outcome.error.as_deref(), Some("HTTP 404: no such hook"));
    }

    #[tokio::test]
    async fn test_send_test_without_config() {
        let err = service().send_test("user-1").await.unwrap_err();
        assert!(matches!(err, WebhookError::NotFound(_)));
    }
}

mod log_tests {
    use super::*;

    #[tokio::test]
    async fn test_logs_and_stats() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Webhook-Event", "resume.parsed"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("X-Webhook-Event", "tailoring.failed"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = service();
        service
            .upsert_config("user-1", DestinationUpdate::new(server.uri()))
            .await
            .unwrap();

        let dispatcher = service.dispatcher();
        for i in 0..3 {
            dispatcher
                .resume_parsed("user-1", &format!("r{i}"), "cv.pdf", json!({}))
                .await
                .unwrap();
        }
        dispatcher
            .tailoring_failed("user-1", "t1", "r1", "j1", "model error")
            .await
            .unwrap();

        let page = service.list_logs("user-1", LogQuery::default()).await.unwrap();
        assert_eq!(page.pagination.total, 4);
        assert!(!page.pagination.has_more);
        assert_eq!(page.logs[0].event, "tailoring.failed");
        assert_eq!(page.logs[0].attempts, 3);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json["logs"][0].get("payload").is_none());
        assert_eq!(json["pagination"]["hasMore"], false);

        let query = LogQuery {
            limit: 2,
            success: Some(true),
            ..Default::default()
        };
        let page = service.list_logs("user-1", query).await.unwrap();
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.logs.len(), 2);
        assert!(page.pagination.has_more);

        let stats = service.stats("user-1").await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.successful, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.average_attempts, 1.5);
        assert_eq!(stats.by_event["tailoring.failed"].failed, 1);

        let other = service.stats("user-2").await.unwrap();
        assert_eq!(other.total, 0);
    }

    #[tokio::test]
    async fn test_offset_past_the_end() {
        let service = service();

        let query = LogQuery {
            offset: usize::MAX,
            ..Default::default()
        };
        let page = service.list_logs("user-1", query).await.unwrap();
        assert!(page.logs.is_empty());
        assert_eq!(page.pagination.offset, usize::MAX);
        assert!(!page.pagination.has_more);
    }
}

//! Webhook configuration routes.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use roleready_webhooks::{
    DeliveryStats, DestinationUpdate, LogPage, LogQuery, WebhookError, WebhookEvent, WebhookService,
};
use serde_json::{Value, json};

use crate::extractor::Owner;

/// Creates an Axum router with all webhook routes.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new().nest("/api/webhooks", webhook_routes(service));
/// ```
pub fn webhook_routes<S>(service: WebhookService) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/config", get(get_config).post(save_config).delete(delete_config))
        .route("/test", post(send_test))
        .route("/logs", get(list_logs))
        .route("/stats", get(stats))
        .route("/regenerate-secret", post(regenerate_secret))
        .with_state(service)
}

/// Error response for webhook routes.
#[derive(Debug)]
pub struct ApiError(WebhookError);

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &self.0 {
            WebhookError::InvalidEvents(invalid) => json!({
                "error": "Invalid event types",
                "invalidEvents": invalid,
            }),
            err if err.is_user_error() => json!({ "error": err.to_string() }),
            err => {
                tracing::error!(error = %err, "Webhook request failed");
                json!({ "error": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

async fn get_config(State(service): State<WebhookService>, Owner(owner_id): Owner) -> ApiResult {
    let available = WebhookEvent::names();

    let body = match service.get_config(&owner_id).await? {
        Some(config) => json!({
            "configured": true,
            "config": config,
            "availableEvents": available,
        }),
        None => json!({
            "configured": false,
            "availableEvents": available,
        }),
    };

    Ok(Json(body))
}

async fn save_config(
    State(service): State<WebhookService>,
    Owner(owner_id): Owner,
    Json(update): Json<DestinationUpdate>,
) -> ApiResult {
    let saved = service.upsert_config(&owner_id, update).await?;

    let mut body = json!({
        "success": true,
        "config": saved.config,
        "message": "Webhook configuration saved successfully",
    });
    if let Some(secret) = saved.secret {
        body["secret"] = Value::String(secret);
    }

    Ok(Json(body))
}

async fn delete_config(State(service): State<WebhookService>, Owner(owner_id): Owner) -> ApiResult {
    service.delete_config(&owner_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Webhook configuration deleted successfully",
    })))
}

async fn send_test(State(service): State<WebhookService>, Owner(owner_id): Owner) -> Result<Response, ApiError> {
    let outcome = service.send_test(&owner_id).await?;

    let response = if outcome.success {
        Json(json!({
            "success": true,
            "message": "Test webhook sent successfully",
            "statusCode": outcome.status_code,
            "deliveryId": outcome.delivery_id,
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "Failed to deliver test webhook",
                "details": outcome.error,
                "statusCode": outcome.status_code,
                "deliveryId": outcome.delivery_id,
            })),
        )
            .into_response()
    };

    Ok(response)
}

async fn list_logs(
    State(service): State<WebhookService>,
    Owner(owner_id): Owner,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogPage>, ApiError> {
    Ok(Json(service.list_logs(&owner_id, query).await?))
}

async fn stats(State(service): State<WebhookService>, Owner(owner_id): Owner) -> Result<Json<DeliveryStats>, ApiError> {
    Ok(Json(service.stats(&owner_id).await?))
}

async fn regenerate_secret(State(service): State<WebhookService>, Owner(owner_id): Owner) -> ApiResult {
    let secret = service.rotate_secret(&owner_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Webhook secret regenerated successfully",
        "secret": secret,
    })))
}

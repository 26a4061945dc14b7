//! Owner extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

/// Header carrying the authenticated owner id, set by the upstream gateway.
pub const OWNER_HEADER: &str = "x-user-id";

/// Extractor for the owner a request acts on behalf of.
///
/// Rejects the request with 401 Unauthorized when the header is missing.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Owner(owner_id): Owner) -> String {
///     format!("Hello, {}!", owner_id)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

/// Error returned when no owner is present.
#[derive(Debug)]
pub struct OwnerRejection {
    message: &'static str,
}

impl IntoResponse for OwnerRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "code": 401
        });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = OwnerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Owner(v.to_string()))
            .ok_or(OwnerRejection {
                message: "Authentication required",
            })
    }
}

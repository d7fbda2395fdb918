mod generate;
mod health;
mod metrics;

pub use generate::generate_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;

use axum::{
    Json, Router,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use thiserror::Error;

use crate::admission::{Decision, QuotaStatus};
use crate::headers::format_headers;
use crate::models::ErrorBody;
use crate::state::AppState;

// Header carrying the authenticated caller, set by the auth layer in front of us
pub const IDENTITY_HEADER: &str = "x-user-id";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing x-user-id header")]
    MissingIdentity,

    #[error("{}", .0.message.as_deref().unwrap_or("Rate limit exceeded."))]
    RateLimited(Decision),

    #[error("Resource quota exhausted.")]
    QuotaExhausted(QuotaStatus),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingIdentity => StatusCode::UNAUTHORIZED,
            GatewayError::RateLimited(_) | GatewayError::QuotaExhausted(_) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        let mut response = (self.status(), Json(body)).into_response();
        let headers = response.headers_mut();
        match &self {
            GatewayError::RateLimited(decision) => {
                apply_rate_headers(headers, decision);
                if let Some(secs) = decision.retry_after_secs {
                    headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
            }
            GatewayError::QuotaExhausted(status) => apply_quota_headers(headers, status),
            _ => {}
        }
        response
    }
}

pub fn apply_rate_headers(headers: &mut HeaderMap, decision: &Decision) {
    for (name, value) in format_headers(decision) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            headers.insert(name, value);
        }
    }
}

pub fn apply_quota_headers(headers: &mut HeaderMap, status: &QuotaStatus) {
    headers.insert("x-quota-limit", HeaderValue::from(status.limit));
    headers.insert("x-quota-remaining", HeaderValue::from(status.remaining));
}

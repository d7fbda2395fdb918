use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;

use super::{GatewayError, IDENTITY_HEADER, apply_quota_headers, apply_rate_headers};
use crate::metrics::REQUEST_LATENCY;
use crate::models::{GenerateRequest, GenerateResponse};
use crate::state::AppState;

fn identity_from(headers: &HeaderMap) -> Result<String, GatewayError> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(GatewayError::MissingIdentity)
}

// admission -> upstream call -> metering
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut payload): Json<GenerateRequest>,
) -> Result<Response, GatewayError> {
    let identity = identity_from(&headers)?;

    let decision = state.admission.check_request_rate(&identity);
    if !decision.allowed {
        return Err(GatewayError::RateLimited(decision));
    }
    if !state.admission.check_resource_quota(&identity) {
        return Err(GatewayError::QuotaExhausted(
            state.admission.quota_status(&identity),
        ));
    }

    // we need the final eval counts, so never stream
    payload.stream = false;

    let start_time = Instant::now();
    let body = state
        .client
        .post(format!("{}/api/generate", state.upstream))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json::<GenerateResponse>()
        .await?;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    state
        .admission
        .report_resource_usage(&identity, body.token_cost());

    let quota = state.admission.quota_status(&identity);
    let mut response = Json(body).into_response();
    apply_rate_headers(response.headers_mut(), &decision);
    apply_quota_headers(response.headers_mut(), &quota);
    Ok(response)
}

use axum::http::header;
use axum::response::IntoResponse;
use prometheus::{Encoder, TextEncoder};

use super::GatewayError;

pub async fn metrics_handler() -> Result<impl IntoResponse, GatewayError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer))
}

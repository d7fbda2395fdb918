use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUESTS_ALLOWED: Counter = register_counter!(
        "admission_requests_allowed_total",
        "Requests admitted by the rate window"
    )
    .unwrap();
    pub static ref REQUESTS_DENIED: Counter = register_counter!(
        "admission_requests_denied_total",
        "Requests rejected by the rate window"
    )
    .unwrap();
    pub static ref QUOTA_DENIED: Counter = register_counter!(
        "admission_quota_denied_total",
        "Quota checks that found the resource budget exhausted"
    )
    .unwrap();
    pub static ref RESOURCE_UNITS: Counter = register_counter!(
        "admission_resource_units_total",
        "Resource units reported by callers"
    )
    .unwrap();
    pub static ref ENTRIES_RECLAIMED: Counter = register_counter!(
        "admission_entries_reclaimed_total",
        "Idle entries evicted by the reclaimer"
    )
    .unwrap();
    // refreshed by each reclaimer sweep, not on every insert
    pub static ref STORE_ENTRIES: Gauge = register_gauge!(
        "admission_store_entries",
        "Identities tracked as of the last reclaimer sweep"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gateway_request_latency_seconds",
        "Upstream request latency in seconds"
    )
    .unwrap();
}

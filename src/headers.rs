//! Rate limit response headers.

use chrono::SecondsFormat;
use std::collections::BTreeMap;

use crate::admission::Decision;

pub const LIMIT: &str = "X-RateLimit-Limit";
pub const REMAINING: &str = "X-RateLimit-Remaining";
pub const RESET: &str = "X-RateLimit-Reset";

/// Standard `X-RateLimit-*` headers for a decision. The reset instant is an
/// ISO-8601 UTC timestamp with millisecond precision.
#[must_use]
pub fn format_headers(decision: &Decision) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        (LIMIT, decision.limit.to_string()),
        (REMAINING, decision.remaining.to_string()),
        (
            RESET,
            decision.reset_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    ])
}

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

// Rate limit entry - tracks requests and resource usage per identity.
// Both windows are fixed: they roll forward from the moment they are renewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub request_count: u32,
    pub request_window_reset_at: DateTime<Utc>,
    pub resource_used: u64,
    pub resource_window_reset_at: DateTime<Utc>,
}

impl Entry {
    // Fresh entry, both windows starting now
    pub fn new(now: DateTime<Utc>, request_window: TimeDelta, resource_window: TimeDelta) -> Self {
        Self {
            request_count: 0,
            request_window_reset_at: now + request_window,
            resource_used: 0,
            resource_window_reset_at: now + resource_window,
        }
    }

    pub fn request_window_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.request_window_reset_at
    }

    pub fn resource_window_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.resource_window_reset_at
    }

    // Nothing left worth keeping once both windows are past their reset instant
    pub fn is_reclaimable(&self, now: DateTime<Utc>) -> bool {
        self.request_window_expired(now) && self.resource_window_expired(now)
    }

    // windows expired..? Reset it. Returns true when the window rolled.
    pub fn roll_request_window(&mut self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        if !self.request_window_expired(now) {
            return false;
        }
        self.request_count = 0;
        self.request_window_reset_at = now + window;
        true
    }

    pub fn roll_resource_window(&mut self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        if !self.resource_window_expired(now) {
            return false;
        }
        self.resource_used = 0;
        self.resource_window_reset_at = now + window;
        true
    }

    // Usage as seen by a reader; an expired window counts as empty
    pub fn effective_resource_used(&self, now: DateTime<Utc>) -> u64 {
        if self.resource_window_expired(now) {
            0
        } else {
            self.resource_used
        }
    }
}

//! Admission decisions.
//!
//! Two independent fixed windows per identity:
//!
//! * the request window, where a slot is reserved as part of the check
//!   itself ([`AdmissionController::check_request_rate`]);
//! * the resource window, where cost is metered after the fact
//!   ([`AdmissionController::report_resource_usage`]) and enforced by a
//!   separate read ([`AdmissionController::check_resource_quota`]).
//!
//! Windows roll forward from the moment they are renewed, so a caller can
//! get up to twice the limit through in a short burst straddling a reset.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AdmissionConfig;
use crate::error::AdmissionError;
use crate::metrics::{QUOTA_DENIED, REQUESTS_ALLOWED, REQUESTS_DENIED, RESOURCE_UNITS};
use crate::rate_limit::Entry;
use crate::reclaimer::Reclaimer;
use crate::store::{MemoryStore, Store};

/// Outcome of a request-rate check, with the metadata HTTP responses need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    /// Slots left in the current window after this request
    pub remaining: u32,
    /// When the current request window resets
    pub reset_at: DateTime<Utc>,
    /// Human-readable reason, only set on denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whole seconds until a retry can succeed, only set on denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl Decision {
    fn allowed(limit: u32, remaining: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            reset_at,
            message: None,
            retry_after_secs: None,
        }
    }

    fn denied(limit: u32, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let wait = ceil_secs(reset_at - now);
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_at,
            message: Some(format!("Rate limit exceeded. Try again in {wait} seconds.")),
            retry_after_secs: Some(wait),
        }
    }
}

// Rounded up, never below one second
fn ceil_secs(delta: TimeDelta) -> u64 {
    let mut secs = delta.num_seconds();
    if delta.subsec_nanos() > 0 {
        secs += 1;
    }
    secs.max(1) as u64
}

/// Read-only view of an identity's resource budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
    /// `None` when the identity has no entry, or its window expired and
    /// reads treat it as rolled
    pub reset_at: Option<DateTime<Utc>>,
}

/// Gatekeeper for the downstream service.
///
/// Owns the policy; state lives in the injected [`Store`], shared with the
/// [`Reclaimer`] obtained from [`AdmissionController::reclaimer`].
#[derive(Debug)]
pub struct AdmissionController<S = MemoryStore, C = SystemClock>
where
    S: Store,
    C: Clock,
{
    store: Arc<S>,
    clock: C,
    config: AdmissionConfig,
    request_window: TimeDelta,
    resource_window: TimeDelta,
}

impl AdmissionController<MemoryStore, SystemClock> {
    /// In-process store, wall clock.
    pub fn in_memory(config: AdmissionConfig) -> Result<Self, AdmissionError> {
        Self::new(config, Arc::new(MemoryStore::new()), SystemClock)
    }
}

impl<S, C> AdmissionController<S, C>
where
    S: Store,
    C: Clock,
{
    pub fn new(config: AdmissionConfig, store: Arc<S>, clock: C) -> Result<Self, AdmissionError> {
        config.validate()?;
        let request_window = config.request_delta()?;
        let resource_window = config.resource_delta()?;
        Ok(Self {
            store,
            clock,
            config,
            request_window,
            resource_window,
        })
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn fresh_entry(&self, now: DateTime<Utc>) -> Entry {
        Entry::new(now, self.request_window, self.resource_window)
    }

    /// Reserve a request slot for `identity` if its window has room.
    ///
    /// The slot is consumed by the check itself: an allowed decision means
    /// the caller may proceed, no separate report is needed.
    pub fn check_request_rate(&self, identity: &str) -> Decision {
        let now = self.clock.now();
        let limit = self.config.requests_per_window;
        let window = self.request_window;

        let decision = self.store.update(
            identity,
            || self.fresh_entry(now),
            |entry| {
                entry.roll_request_window(now, window);
                if entry.request_count >= limit {
                    return Decision::denied(limit, entry.request_window_reset_at, now);
                }
                entry.request_count += 1;
                Decision::allowed(
                    limit,
                    limit - entry.request_count,
                    entry.request_window_reset_at,
                )
            },
        );

        if decision.allowed {
            REQUESTS_ALLOWED.inc();
            debug!(identity, remaining = decision.remaining, "request admitted");
        } else {
            REQUESTS_DENIED.inc();
            warn!(
                identity,
                retry_after_secs = decision.retry_after_secs,
                "rate limit exceeded"
            );
        }
        decision
    }

    /// Whether `identity` still has resource budget in its current window.
    ///
    /// Never creates an entry: an identity that never touched the store
    /// cannot be over quota.
    pub fn check_resource_quota(&self, identity: &str) -> bool {
        let Some(entry) = self.store.get(identity) else {
            return true;
        };
        let used = self.used_in_window(&entry, self.clock.now());
        let within = used < self.config.resource_per_window;
        if !within {
            QUOTA_DENIED.inc();
            warn!(identity, used, limit = self.config.resource_per_window, "resource quota exhausted");
        }
        within
    }

    /// Meter `amount` units against `identity`. Does not enforce the quota.
    ///
    /// An expired resource window is rolled before the amount is added, so
    /// usage always lands in a live window.
    pub fn report_resource_usage(&self, identity: &str, amount: u64) {
        let now = self.clock.now();
        let window = self.resource_window;

        let used = self.store.update(
            identity,
            || self.fresh_entry(now),
            |entry| {
                entry.roll_resource_window(now, window);
                entry.resource_used = entry.resource_used.saturating_add(amount);
                entry.resource_used
            },
        );

        RESOURCE_UNITS.inc_by(amount as f64);
        debug!(identity, amount, used, "resource usage reported");
    }

    /// Current resource budget of `identity`, without side effects.
    pub fn quota_status(&self, identity: &str) -> QuotaStatus {
        let limit = self.config.resource_per_window;
        let now = self.clock.now();
        let (used, reset_at) = match self.store.get(identity) {
            Some(entry) => {
                // a stale window still governs when reads do not roll it
                let live = !self.config.quota_rolls_on_read || !entry.resource_window_expired(now);
                (
                    self.used_in_window(&entry, now),
                    live.then_some(entry.resource_window_reset_at),
                )
            }
            None => (0, None),
        };
        QuotaStatus {
            limit,
            used,
            remaining: limit.saturating_sub(used),
            reset_at,
        }
    }

    fn used_in_window(&self, entry: &Entry, now: DateTime<Utc>) -> u64 {
        if self.config.quota_rolls_on_read {
            entry.effective_resource_used(now)
        } else {
            entry.resource_used
        }
    }

    /// Sweeper over the same store and clock.
    pub fn reclaimer(&self) -> Reclaimer<S, C>
    where
        C: Clone,
    {
        Reclaimer::new(Arc::clone(&self.store), self.clock.clone())
    }
}

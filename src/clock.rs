// src/clock.rs

// time source used by the admission controller and the reclaimer

use chrono::{DateTime, Utc};

/// Abstracts "now" so window arithmetic can be driven deterministically.
/// Implementors must be thread-safe (Send + Sync).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, the default for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

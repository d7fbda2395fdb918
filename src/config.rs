use chrono::TimeDelta;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::error::AdmissionError;

pub const DEFAULT_REQUESTS_PER_WINDOW: u32 = 10;
pub const DEFAULT_REQUEST_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_RESOURCE_PER_WINDOW: u64 = 100_000;
pub const DEFAULT_RESOURCE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_RECLAIM_INTERVAL: Duration = Duration::from_secs(60);

// Anything longer would push reset instants toward chrono's representable range
const MAX_WINDOW: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Admission policy for one controller: a request-rate window and an
/// independent resource-quota window.
///
/// Durations are (de)serialized as milliseconds under the keys
/// `requestWindowDuration`, `resourceWindowDuration` and `reclaimInterval`.
/// Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdmissionConfig {
    pub(crate) requests_per_window: u32,
    #[serde(rename = "requestWindowDuration", with = "duration_ms")]
    pub(crate) request_window: Duration,
    pub(crate) resource_per_window: u64,
    #[serde(rename = "resourceWindowDuration", with = "duration_ms")]
    pub(crate) resource_window: Duration,
    #[serde(with = "duration_ms")]
    pub(crate) reclaim_interval: Duration,
    pub(crate) quota_rolls_on_read: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            requests_per_window: DEFAULT_REQUESTS_PER_WINDOW,
            request_window: DEFAULT_REQUEST_WINDOW,
            resource_per_window: DEFAULT_RESOURCE_PER_WINDOW,
            resource_window: DEFAULT_RESOURCE_WINDOW,
            reclaim_interval: DEFAULT_RECLAIM_INTERVAL,
            quota_rolls_on_read: true,
        }
    }
}

impl AdmissionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: max admitted requests per request window
    pub fn requests_per_window(mut self, limit: u32) -> Self {
        self.requests_per_window = limit;
        self
    }

    pub fn request_window(mut self, window: Duration) -> Self {
        self.request_window = window;
        self
    }

    /// Builder-style: resource units allowed per quota window
    pub fn resource_per_window(mut self, limit: u64) -> Self {
        self.resource_per_window = limit;
        self
    }

    pub fn resource_window(mut self, window: Duration) -> Self {
        self.resource_window = window;
        self
    }

    pub fn reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval = interval;
        self
    }

    /// When set, a quota read treats an expired resource window as empty.
    /// When cleared, the stale usage is compared as-is until the next report.
    pub fn quota_rolls_on_read(mut self, enabled: bool) -> Self {
        self.quota_rolls_on_read = enabled;
        self
    }

    pub fn request_limit(&self) -> u32 {
        self.requests_per_window
    }

    pub fn resource_limit(&self) -> u64 {
        self.resource_per_window
    }

    pub fn request_window_duration(&self) -> Duration {
        self.request_window
    }

    pub fn resource_window_duration(&self) -> Duration {
        self.resource_window
    }

    pub fn reclaim_period(&self) -> Duration {
        self.reclaim_interval
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.requests_per_window == 0 {
            return Err(AdmissionError::InvalidRequestLimit);
        }
        if self.resource_per_window == 0 {
            return Err(AdmissionError::InvalidResourceLimit);
        }
        to_delta(self.request_window, "request window")?;
        to_delta(self.resource_window, "resource window")?;
        to_delta(self.reclaim_interval, "reclaim interval")?;

        let shortest = self.request_window.min(self.resource_window);
        if self.reclaim_interval > shortest {
            warn!(
                reclaim_interval = ?self.reclaim_interval,
                shortest_window = ?shortest,
                "reclaim interval is longer than the shortest window, idle entries will linger"
            );
        }
        Ok(())
    }

    pub(crate) fn request_delta(&self) -> Result<TimeDelta, AdmissionError> {
        to_delta(self.request_window, "request window")
    }

    pub(crate) fn resource_delta(&self) -> Result<TimeDelta, AdmissionError> {
        to_delta(self.resource_window, "resource window")
    }

    /// Load from a JSON document, e.g. `{"requestsPerWindow": 20}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigFileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
}

fn to_delta(window: Duration, name: &'static str) -> Result<TimeDelta, AdmissionError> {
    if window.is_zero() {
        return Err(AdmissionError::InvalidWindow { name });
    }
    if window > MAX_WINDOW {
        return Err(AdmissionError::WindowOutOfRange { name });
    }
    TimeDelta::from_std(window).map_err(|_| AdmissionError::WindowOutOfRange { name })
}

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] AdmissionError),
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-gateway")]
#[command(about = "Admission-controlled gateway in front of an Ollama-compatible chat backend")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Upstream chat backend
    #[arg(short, long, default_value = "http://localhost:11434")]
    pub upstream: String,

    // Rate limit max requests per window
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_WINDOW)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // Resource (token) units allowed per quota window
    #[arg(long, default_value_t = DEFAULT_RESOURCE_PER_WINDOW)]
    pub resource_limit: u64,

    // Quota window in seconds
    #[arg(long, default_value_t = 86_400)]
    pub resource_window: u64,

    // How often idle identities are swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub reclaim_interval: u64,

    // JSON admission config; overrides the limit flags above
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn admission_config(&self) -> Result<AdmissionConfig, ConfigFileError> {
        if let Some(path) = &self.config {
            return AdmissionConfig::from_json_file(path);
        }
        let config = AdmissionConfig::new()
            .requests_per_window(self.rate_limit)
            .request_window(Duration::from_secs(self.rate_window))
            .resource_per_window(self.resource_limit)
            .resource_window(Duration::from_secs(self.resource_window))
            .reclaim_interval(Duration::from_secs(self.reclaim_interval));
        config.validate()?;
        Ok(config)
    }
}

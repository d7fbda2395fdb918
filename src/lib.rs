//! # chat-gateway
//!
//! Per-identity admission control in front of an expensive chat backend.
//!
//! Each identity gets a fixed request-rate window and an independent
//! resource-quota window. A background reclaimer evicts identities whose
//! windows have all expired.
//!
//! ```rust
//! use chat_gateway::{AdmissionConfig, AdmissionController, format_headers};
//!
//! let admission = AdmissionController::in_memory(AdmissionConfig::default()).unwrap();
//!
//! let decision = admission.check_request_rate("user_123");
//! if decision.allowed && admission.check_resource_quota("user_123") {
//!     // ... call the backend, then meter what it cost
//!     admission.report_resource_usage("user_123", 512);
//! }
//! let headers = format_headers(&decision);
//! assert_eq!(headers["X-RateLimit-Remaining"], "9");
//! ```

pub mod admission;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod headers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod reclaimer;
pub mod state;
pub mod store;

pub use admission::{AdmissionController, Decision, QuotaStatus};
pub use clock::{Clock, SystemClock};
pub use config::{AdmissionConfig, Args, ConfigFileError};
pub use error::AdmissionError;
pub use headers::format_headers;
pub use rate_limit::Entry;
pub use reclaimer::{Reclaimer, ReclaimerHandle};
pub use store::{MemoryStore, Store};

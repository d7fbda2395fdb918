// src/error.rs

// error handling for admission configuration

use thiserror::Error;

/// Configuration problems, reported when a controller is built.
/// Admission checks themselves never fail; a denial is a normal return value.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("requests per window must be positive")]
    InvalidRequestLimit,

    #[error("resource per window must be positive")]
    InvalidResourceLimit,

    #[error("{name} must be a positive duration")]
    InvalidWindow { name: &'static str },

    #[error("{name} is too large to represent")]
    WindowOutOfRange { name: &'static str },
}

//! Error types for the schedule store client

use chrono::NaiveDate;
use thiserror::Error;

/// Errors talking to the schedule store
///
/// Callers treat every variant uniformly as a failed request; the variants
/// only exist for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The configured base URL cannot be used
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The store answered with a non-success status
    #[error("Store returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// A schedule request rejected before it is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task name is empty or whitespace
    #[error("Task name must not be empty")]
    EmptyTaskName,

    /// Interval of zero
    #[error("Interval must be at least 1")]
    ZeroInterval,

    /// End date precedes start date
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },

    /// Frequency name not recognised
    #[error("Unknown frequency: {0}")]
    UnknownFrequency(String),
}

//! Configuration management for the taskboard client.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Schedule store connection
    pub api: ApiConfig,
    /// Presentation and feature settings
    pub board: BoardConfig,
    /// Runtime settings
    pub runtime: RuntimeConfig,
}

/// Schedule store connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the schedule store
    pub base_url: String,
    /// Per-request timeout in seconds (none when unset)
    pub request_timeout_secs: Option<u64>,
}

/// Presentation and feature settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Events per page
    pub page_size: usize,
    /// Lifetime of a toast without an explicit duration, in milliseconds
    pub toast_duration_ms: u64,
    /// Delay between a successful schedule creation and leaving the form, in milliseconds
    pub redirect_delay_ms: u64,
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// How long shutdown waits for in-flight effects, in seconds
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                base_url: env::var("TASKBOARD_API_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                request_timeout_secs: env::var("TASKBOARD_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
            board: BoardConfig {
                page_size: env::var("TASKBOARD_PAGE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|size| *size > 0)
                    .unwrap_or(10),
                toast_duration_ms: env::var("TASKBOARD_TOAST_DURATION_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
                redirect_delay_ms: env::var("TASKBOARD_REDIRECT_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1500),
            },
            runtime: RuntimeConfig {
                shutdown_timeout_secs: env::var("TASKBOARD_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                request_timeout_secs: None,
            },
            board: BoardConfig {
                page_size: 10,
                toast_duration_ms: 3000,
                redirect_delay_ms: 1500,
            },
            runtime: RuntimeConfig {
                shutdown_timeout_secs: 5,
            },
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl BoardConfig {
    /// Default toast lifetime
    #[must_use]
    pub const fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// Delay before leaving the creation form
    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

impl RuntimeConfig {
    /// Shutdown wait as a [`Duration`]
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

//! # Taskboard Client
//!
//! Entity model and store access for the Taskboard client.
//!
//! - [`types`]: schedules, event occurrences and the event status state machine
//! - [`ScheduleApi`]: the operations of the schedule store
//! - [`HttpScheduleApi`]: the store over HTTP/JSON (reqwest)
//! - [`MockScheduleApi`]: an in-memory store for development and tests
//!
//! ## Example
//!
//! ```ignore
//! use taskboard_client::{HttpScheduleApi, ScheduleApi, ScheduleId};
//!
//! let api = HttpScheduleApi::new("http://localhost:8080")?;
//! let events = api.list_events(&ScheduleId::new("42")).await?;
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

pub use api::{ApiFuture, ApiResult, ScheduleApi};
pub use error::{ApiError, ValidationError};
pub use http::HttpScheduleApi;
pub use mock::{MockScheduleApi, Operation};
pub use types::{
    CreatedSchedule, DashboardMetrics, Event, EventKey, EventStatus, Frequency, NewSchedule,
    Schedule, ScheduleId, StatusUpdate,
};

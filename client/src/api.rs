//! Schedule store abstraction
//!
//! Features hold an `Arc<dyn ScheduleApi>` in their environment. Production
//! uses [`HttpScheduleApi`](crate::HttpScheduleApi); tests use
//! [`MockScheduleApi`](crate::MockScheduleApi).

use crate::error::ApiError;
use crate::types::{
    CreatedSchedule, DashboardMetrics, Event, NewSchedule, Schedule, ScheduleId, StatusUpdate,
};
use std::future::Future;
use std::pin::Pin;

/// Result of a store call
pub type ApiResult<T> = Result<T, ApiError>;

/// Boxed future returned by [`ScheduleApi`] methods
pub type ApiFuture<T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send>>;

/// Operations offered by the schedule store
pub trait ScheduleApi: Send + Sync {
    /// `GET /schedules`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the store rejects it
    fn list_schedules(&self) -> ApiFuture<Vec<Schedule>>;

    /// `GET /dashboard`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the store rejects it
    fn dashboard_metrics(&self) -> ApiFuture<DashboardMetrics>;

    /// `POST /schedules`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the store rejects it
    fn create_schedule(&self, schedule: NewSchedule) -> ApiFuture<CreatedSchedule>;

    /// `GET /schedules/{id}/events`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the store rejects it
    fn list_events(&self, schedule_id: &ScheduleId) -> ApiFuture<Vec<Event>>;

    /// `PATCH /schedules/{id}/events`
    ///
    /// Resolves to the updated event when the store echoes it back, `None`
    /// when it only acknowledges the change.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the store rejects it
    fn update_event_status(&self, update: StatusUpdate) -> ApiFuture<Option<Event>>;
}

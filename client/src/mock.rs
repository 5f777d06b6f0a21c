//! In-memory schedule store for development and tests
//!
//! Holds schedules and events in memory, applies successful status updates
//! to its own copy, and lets tests inject failures, count calls, and hold
//! status updates in flight.

use crate::api::{ApiFuture, ScheduleApi};
use crate::error::ApiError;
use crate::types::{
    CreatedSchedule, DashboardMetrics, Event, NewSchedule, Schedule, ScheduleId, StatusUpdate,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// A store operation, used to inject failures and read call counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /schedules`
    ListSchedules,
    /// `GET /dashboard`
    DashboardMetrics,
    /// `POST /schedules`
    CreateSchedule,
    /// `GET /schedules/{id}/events`
    ListEvents,
    /// `PATCH /schedules/{id}/events`
    UpdateEventStatus,
}

#[derive(Default)]
struct MockData {
    schedules: Vec<Schedule>,
    metrics: DashboardMetrics,
    events: HashMap<ScheduleId, Vec<Event>>,
    failing: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
    next_id: u64,
}

struct MockInner {
    data: Mutex<MockData>,
    // `true` holds status updates before they are applied
    update_gate: watch::Sender<bool>,
}

/// In-memory [`ScheduleApi`]
///
/// Clones share the same data.
#[derive(Clone)]
pub struct MockScheduleApi {
    inner: Arc<MockInner>,
}

impl MockScheduleApi {
    /// Creates an empty mock store
    #[must_use]
    pub fn new() -> Self {
        let (update_gate, _) = watch::channel(false);
        Self {
            inner: Arc::new(MockInner {
                data: Mutex::new(MockData {
                    next_id: 1,
                    ..MockData::default()
                }),
                update_gate,
            }),
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(&self) -> Arc<dyn ScheduleApi> {
        Arc::new(self.clone())
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.inner.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds the events of a schedule
    #[must_use]
    pub fn with_events(self, schedule_id: ScheduleId, events: Vec<Event>) -> Self {
        self.data().events.insert(schedule_id, events);
        self
    }

    /// Seeds the schedule listing
    #[must_use]
    pub fn with_schedules(self, schedules: Vec<Schedule>) -> Self {
        self.data().schedules = schedules;
        self
    }

    /// Seeds the dashboard counters
    #[must_use]
    pub fn with_metrics(self, metrics: DashboardMetrics) -> Self {
        self.data().metrics = metrics;
        self
    }

    /// Makes every following call of `operation` fail
    pub fn fail(&self, operation: Operation) {
        self.data().failing.insert(operation);
    }

    /// Makes `operation` succeed again
    pub fn recover(&self, operation: Operation) {
        self.data().failing.remove(&operation);
    }

    /// Number of times `operation` was called
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.data().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Current events of a schedule as held by the store
    #[must_use]
    pub fn events(&self, schedule_id: &ScheduleId) -> Vec<Event> {
        self.data()
            .events
            .get(schedule_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Holds status updates in flight until [`resume_updates`](Self::resume_updates)
    pub fn pause_updates(&self) {
        self.inner.update_gate.send_replace(true);
    }

    /// Releases held status updates
    pub fn resume_updates(&self) {
        self.inner.update_gate.send_replace(false);
    }

    /// Records a call and reports whether it should fail
    fn enter(&self, operation: Operation) -> Result<(), ApiError> {
        let mut data = self.data();
        *data.calls.entry(operation).or_insert(0) += 1;
        if data.failing.contains(&operation) {
            tracing::debug!(?operation, "Injected failure");
            return Err(ApiError::RequestFailed(format!(
                "injected failure for {operation:?}"
            )));
        }
        Ok(())
    }
}

impl Default for MockScheduleApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleApi for MockScheduleApi {
    fn list_schedules(&self) -> ApiFuture<Vec<Schedule>> {
        let result = self
            .enter(Operation::ListSchedules)
            .map(|()| self.data().schedules.clone());
        Box::pin(async move { result })
    }

    fn dashboard_metrics(&self) -> ApiFuture<DashboardMetrics> {
        let result = self
            .enter(Operation::DashboardMetrics)
            .map(|()| self.data().metrics);
        Box::pin(async move { result })
    }

    fn create_schedule(&self, schedule: NewSchedule) -> ApiFuture<CreatedSchedule> {
        let result = self.enter(Operation::CreateSchedule).map(|()| {
            let mut data = self.data();
            let id = ScheduleId::new(data.next_id.to_string());
            data.next_id += 1;
            data.schedules.push(Schedule {
                id: id.clone(),
                task_name: schedule.task_name.clone(),
                rrule: None,
                frequency: Some(schedule.frequency),
                start_date: None,
                end_date: None,
                total_events: 0,
                created_at: None,
            });
            CreatedSchedule {
                id: Some(id),
                task_name: schedule.task_name,
                total_events: 0,
            }
        });
        Box::pin(async move { result })
    }

    fn list_events(&self, schedule_id: &ScheduleId) -> ApiFuture<Vec<Event>> {
        let result = self
            .enter(Operation::ListEvents)
            .map(|()| self.events(schedule_id));
        Box::pin(async move { result })
    }

    fn update_event_status(&self, update: StatusUpdate) -> ApiFuture<Option<Event>> {
        let admitted = self.enter(Operation::UpdateEventStatus);
        let mut gate = self.inner.update_gate.subscribe();
        let api = self.clone();

        Box::pin(async move {
            admitted?;

            let released = gate.wait_for(|paused| !*paused).await.is_ok();
            if !released {
                return Err(ApiError::RequestFailed("mock store dropped".to_string()));
            }

            let key = update.key();
            let mut data = api.data();
            let updated = data
                .events
                .get_mut(&update.schedule_id)
                .and_then(|events| events.iter_mut().find(|event| event.matches(&key)))
                .map(|event| {
                    event.status = update.status;
                    event.clone()
                });
            Ok(updated)
        })
    }
}

//! Event board: the events of one schedule, paginated, with optimistic
//! status changes.
//!
//! A status change goes through these steps:
//!
//! 1. The event key must not be busy; a second change for a busy key is
//!    dropped locally with no request and no state change.
//! 2. The key is marked busy and the new status is applied speculatively, so
//!    the list shows it before the store answers.
//! 3. The store is patched.
//! 4. On success a success toast is shown, then the full list is refetched
//!    and replaces the snapshot.
//! 5. On failure the previous status is restored and an error toast is shown.
//!
//! The busy mark is cleared on every way out of steps 4 and 5. Changes on
//! different events run concurrently and may finish in any order.

use crate::overlay::EventOverlay;
use crate::pagination::Paginator;
use crate::toaster::{Notifier, ToastKind};
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;
use std::sync::Arc;
use taskboard_client::{Event, EventKey, EventStatus, ScheduleApi, ScheduleId, StatusUpdate};
use taskboard_core::effect::Effect;
use taskboard_core::reducer::Reducer;
use taskboard_core::{smallvec, SmallVec};

/// Banner shown when the event list cannot be loaded
pub const LOAD_EVENTS_FAILED: &str = "Failed to load events. Please try again later.";

/// Toast shown when the store rejects a status change
pub const STATUS_UPDATE_FAILED: &str = "Failed to update event status";

/// Toast shown when the store accepts a status change
#[must_use]
pub fn status_updated_message(status: EventStatus) -> String {
    format!("Event updated to {}", status.label())
}

// ============================================================================
// State
// ============================================================================

/// State of the event board of one schedule
#[derive(Clone, Debug)]
pub struct EventBoardState {
    /// Schedule whose events are shown
    pub schedule_id: ScheduleId,
    /// Page cursor over the event list
    pub pagination: Paginator,
    /// Whether a list fetch is in flight
    pub loading: bool,
    /// Page-level error banner
    pub error: Option<String>,
    overlay: EventOverlay,
    in_flight: HashSet<EventKey>,
}

impl EventBoardState {
    /// Creates an empty board for `schedule_id`
    #[must_use]
    pub fn new(schedule_id: ScheduleId, page_size: usize) -> Self {
        Self {
            schedule_id,
            pagination: Paginator::new(page_size),
            loading: false,
            error: None,
            overlay: EventOverlay::default(),
            in_flight: HashSet::new(),
        }
    }

    /// Seeds the board with a fetched list
    #[must_use]
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.replace_events(events, None);
        self
    }

    /// Key of the event at `event_datetime` in this board's schedule
    #[must_use]
    pub fn key_at(&self, event_datetime: DateTime<FixedOffset>) -> EventKey {
        EventKey::new(self.schedule_id.clone(), event_datetime)
    }

    /// Whether a status change is in flight for `key`
    #[must_use]
    pub fn is_busy(&self, key: &EventKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Number of status changes in flight
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// The full list as displayed (speculative changes applied)
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.overlay.events()
    }

    /// The current page as displayed
    #[must_use]
    pub fn page_events(&self) -> Vec<Event> {
        self.overlay.events_in(self.pagination.page_range())
    }

    /// The displayed event identified by `key`
    #[must_use]
    pub fn event(&self, key: &EventKey) -> Option<Event> {
        self.overlay.event(key)
    }

    /// Task name carried by the first event
    #[must_use]
    pub fn task_name(&self) -> Option<&str> {
        self.overlay
            .snapshot()
            .first()
            .and_then(|event| event.task_name.as_deref())
    }

    fn replace_events(&mut self, events: Vec<Event>, reconciled: Option<&EventKey>) {
        self.overlay.replace_snapshot(events, reconciled);
        self.pagination.set_total_items(self.overlay.len());
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Event board actions
#[derive(Clone, Debug, PartialEq)]
pub enum EventBoardAction {
    /// Fetch the event list
    LoadEvents,
    /// List fetched
    EventsLoaded {
        /// Authoritative list
        events: Vec<Event>,
    },
    /// List fetch failed
    EventsLoadFailed {
        /// Raw error, for logs only
        error: String,
    },
    /// User asked to move an event to `status`
    ChangeStatus {
        /// Occurrence timestamp identifying the event
        event_datetime: DateTime<FixedOffset>,
        /// Requested status
        status: EventStatus,
    },
    /// Store accepted the change
    StatusUpdated {
        /// Changed event
        key: EventKey,
        /// New status
        status: EventStatus,
    },
    /// Store rejected the change or could not be reached
    StatusUpdateFailed {
        /// Changed event
        key: EventKey,
        /// The event as displayed before the change
        previous: Event,
        /// Raw error, for logs only
        error: String,
    },
    /// List refetched after an accepted change
    EventsReconciled {
        /// Changed event
        key: EventKey,
        /// Authoritative list
        events: Vec<Event>,
    },
    /// Refetch after an accepted change failed
    ReconcileFailed {
        /// Changed event
        key: EventKey,
        /// Raw error, for logs only
        error: String,
    },
    /// Jump to a page
    GoToPage {
        /// 1-based page, clamped into range
        page: usize,
    },
    /// Next page (no-op on the last page)
    NextPage,
    /// Previous page (no-op on page 1)
    PreviousPage,
}

// ============================================================================
// Environment
// ============================================================================

/// Event board dependencies
#[derive(Clone)]
pub struct EventBoardEnvironment {
    /// Schedule store
    pub api: Arc<dyn ScheduleApi>,
    /// Toast sink
    pub notifier: Arc<dyn Notifier>,
}

impl EventBoardEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(api: Arc<dyn ScheduleApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the event board
#[derive(Clone, Copy, Debug, Default)]
pub struct EventBoardReducer;

impl EventBoardReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(key: &EventKey, reason: &'static str) -> SmallVec<[Effect<EventBoardAction>; 4]> {
        tracing::debug!(%key, reason, "Status change rejected");
        metrics::counter!("event_board.transition.rejected", "reason" => reason).increment(1);
        smallvec![Effect::None]
    }

    fn fetch(api: &Arc<dyn ScheduleApi>, schedule_id: ScheduleId) -> Effect<EventBoardAction> {
        let api = Arc::clone(api);
        Effect::future(async move {
            match api.list_events(&schedule_id).await {
                Ok(events) => Some(EventBoardAction::EventsLoaded { events }),
                Err(error) => Some(EventBoardAction::EventsLoadFailed {
                    error: error.to_string(),
                }),
            }
        })
    }

    fn change_status(
        state: &mut EventBoardState,
        event_datetime: DateTime<FixedOffset>,
        status: EventStatus,
        env: &EventBoardEnvironment,
    ) -> SmallVec<[Effect<EventBoardAction>; 4]> {
        let key = state.key_at(event_datetime);

        if state.is_busy(&key) {
            return Self::reject(&key, "busy");
        }
        let Some(previous) = state.overlay.event(&key) else {
            return Self::reject(&key, "unknown_event");
        };
        if !previous.status.can_transition_to(status) {
            tracing::warn!(%key, from = %previous.status, to = %status, "Invalid status transition");
            return Self::reject(&key, "invalid_transition");
        }

        state.in_flight.insert(key.clone());
        state.overlay.apply_speculative(key.clone(), status);

        tracing::info!(
            schedule_id = %key.schedule_id,
            event_datetime = %previous.event_datetime,
            %status,
            "Dispatching status change"
        );
        metrics::counter!("event_board.transition.dispatched").increment(1);

        let api = Arc::clone(&env.api);
        let update = StatusUpdate {
            schedule_id: key.schedule_id.clone(),
            event_datetime: previous.event_datetime,
            status,
        };

        smallvec![Effect::future(async move {
            match api.update_event_status(update).await {
                Ok(_) => Some(EventBoardAction::StatusUpdated { key, status }),
                Err(error) => Some(EventBoardAction::StatusUpdateFailed {
                    key,
                    previous,
                    error: error.to_string(),
                }),
            }
        })]
    }
}

impl Reducer for EventBoardReducer {
    type State = EventBoardState;
    type Action = EventBoardAction;
    type Environment = EventBoardEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            EventBoardAction::LoadEvents => {
                state.loading = true;
                smallvec![Self::fetch(&env.api, state.schedule_id.clone())]
            },

            EventBoardAction::EventsLoaded { events } => {
                tracing::debug!(schedule_id = %state.schedule_id, count = events.len(), "Events loaded");
                state.loading = false;
                state.error = None;
                state.replace_events(events, None);
                smallvec![Effect::None]
            },

            EventBoardAction::EventsLoadFailed { error } => {
                tracing::error!(schedule_id = %state.schedule_id, %error, "Failed to load events");
                metrics::counter!("event_board.load.failed").increment(1);
                state.loading = false;
                state.error = Some(LOAD_EVENTS_FAILED.to_string());
                state.replace_events(Vec::new(), None);
                smallvec![Effect::None]
            },

            EventBoardAction::ChangeStatus {
                event_datetime,
                status,
            } => Self::change_status(state, event_datetime, status, env),

            EventBoardAction::StatusUpdated { key, status } => {
                tracing::info!(%key, %status, "Status change accepted");
                metrics::counter!("event_board.transition.succeeded").increment(1);

                let notifier = Arc::clone(&env.notifier);
                let api = Arc::clone(&env.api);
                let schedule_id = key.schedule_id.clone();

                smallvec![Effect::chain(vec![
                    Effect::future(async move {
                        notifier
                            .notify(ToastKind::Success, status_updated_message(status))
                            .await;
                        None
                    }),
                    Effect::future(async move {
                        match api.list_events(&schedule_id).await {
                            Ok(events) => Some(EventBoardAction::EventsReconciled { key, events }),
                            Err(error) => Some(EventBoardAction::ReconcileFailed {
                                key,
                                error: error.to_string(),
                            }),
                        }
                    }),
                ])]
            },

            EventBoardAction::StatusUpdateFailed {
                key,
                previous,
                error,
            } => {
                tracing::error!(%key, %error, "Status change failed, rolling back");
                metrics::counter!("event_board.transition.failed").increment(1);

                state.overlay.rollback(&key, previous.status);
                state.in_flight.remove(&key);

                let notifier = Arc::clone(&env.notifier);
                smallvec![Effect::future(async move {
                    notifier
                        .notify(ToastKind::Error, STATUS_UPDATE_FAILED.to_string())
                        .await;
                    None
                })]
            },

            EventBoardAction::EventsReconciled { key, events } => {
                tracing::debug!(%key, count = events.len(), "Events reconciled");
                state.error = None;
                state.replace_events(events, Some(&key));
                state.in_flight.remove(&key);
                smallvec![Effect::None]
            },

            EventBoardAction::ReconcileFailed { key, error } => {
                // The store accepted the change, so keep it
                tracing::error!(%key, %error, "Refetch after status change failed");
                metrics::counter!("event_board.reconcile.failed").increment(1);
                state.overlay.commit(&key);
                state.in_flight.remove(&key);
                smallvec![Effect::None]
            },

            EventBoardAction::GoToPage { page } => {
                state.pagination.go_to(page);
                smallvec![Effect::None]
            },

            EventBoardAction::NextPage => {
                state.pagination.next();
                smallvec![Effect::None]
            },

            EventBoardAction::PreviousPage => {
                state.pagination.previous();
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::toaster::{ToasterEnvironment, ToasterReducer, ToasterState, ToasterStore};
    use std::time::Duration;
    use taskboard_client::MockScheduleApi;
    use taskboard_testing::{assertions, test_clock, ReducerTest};

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn event(at_raw: &str, status: EventStatus) -> Event {
        Event {
            id: None,
            schedule_id: ScheduleId::new("1"),
            event_datetime: at(at_raw),
            status,
            task_name: Some("Water plants".into()),
        }
    }

    fn env() -> EventBoardEnvironment {
        let toaster = ToasterStore::new(
            ToasterState::default(),
            ToasterReducer,
            ToasterEnvironment::new(Arc::new(test_clock()), Duration::from_secs(3)),
        );
        EventBoardEnvironment::new(MockScheduleApi::new().shared(), Arc::new(toaster))
    }

    fn board(events: Vec<Event>) -> EventBoardState {
        EventBoardState::new(ScheduleId::new("1"), 10).with_events(events)
    }

    const FIRST: &str = "2024-01-01T10:00:00Z";

    #[test]
    fn test_change_status_applies_speculatively_and_marks_busy() {
        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![event(FIRST, EventStatus::Pending)]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::InProgress,
            })
            .then_state(|state| {
                let key = state.key_at(at(FIRST));
                assert!(state.is_busy(&key));
                assert_eq!(state.events()[0].status, EventStatus::InProgress);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_second_change_while_busy_is_dropped() {
        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![event(FIRST, EventStatus::Pending)]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::InProgress,
            })
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::InProgress,
            })
            .then_state(|state| {
                assert_eq!(state.in_flight_count(), 1);
                assert_eq!(state.events()[0].status, EventStatus::InProgress);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_invalid_transition_is_dropped() {
        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![event(FIRST, EventStatus::Pending)]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::Completed,
            })
            .then_state(|state| {
                assert_eq!(state.in_flight_count(), 0);
                assert_eq!(state.events()[0].status, EventStatus::Pending);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_unknown_event_is_dropped() {
        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![event(FIRST, EventStatus::Pending)]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at("2030-01-01T00:00:00Z"),
                status: EventStatus::InProgress,
            })
            .then_state(|state| assert_eq!(state.in_flight_count(), 0))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_failure_rolls_back_and_clears_busy() {
        let original = event(FIRST, EventStatus::InProgress);
        let key = original.key();

        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![original.clone()]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::Completed,
            })
            .when_action(EventBoardAction::StatusUpdateFailed {
                key,
                previous: original,
                error: "connection refused".into(),
            })
            .then_state(|state| {
                assert_eq!(state.in_flight_count(), 0);
                assert_eq!(state.events()[0].status, EventStatus::InProgress);
                assert!(state.error.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_success_notifies_then_refetches() {
        let original = event(FIRST, EventStatus::Pending);
        let key = original.key();

        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![original]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::InProgress,
            })
            .when_action(EventBoardAction::StatusUpdated {
                key,
                status: EventStatus::InProgress,
            })
            .then_state(|state| {
                // Busy until the refetch lands
                assert_eq!(state.in_flight_count(), 1);
                assert_eq!(state.events()[0].status, EventStatus::InProgress);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                match &effects[0] {
                    Effect::Sequential(steps) => assert_eq!(steps.len(), 2),
                    other => panic!("expected sequential effect, got {other:?}"),
                }
            })
            .run();
    }

    #[test]
    fn test_reconciled_list_replaces_snapshot() {
        let original = event(FIRST, EventStatus::Pending);
        let key = original.key();

        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![original]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::InProgress,
            })
            .when_action(EventBoardAction::EventsReconciled {
                key,
                events: vec![
                    event(FIRST, EventStatus::InProgress),
                    event("2024-01-02T10:00:00Z", EventStatus::Overdue),
                ],
            })
            .then_state(|state| {
                assert_eq!(state.in_flight_count(), 0);
                assert_eq!(state.pagination.total_items(), 2);
                let statuses: Vec<_> = state.events().iter().map(|e| e.status).collect();
                assert_eq!(statuses, vec![EventStatus::InProgress, EventStatus::Overdue]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_refetch_failure_commits_accepted_change() {
        let original = event(FIRST, EventStatus::Pending);
        let key = original.key();

        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![original]))
            .when_action(EventBoardAction::ChangeStatus {
                event_datetime: at(FIRST),
                status: EventStatus::InProgress,
            })
            .when_action(EventBoardAction::ReconcileFailed {
                key,
                error: "timeout".into(),
            })
            .then_state(|state| {
                assert_eq!(state.in_flight_count(), 0);
                assert_eq!(state.events()[0].status, EventStatus::InProgress);
                assert!(state.error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_load_failure_sets_banner_and_empties_list() {
        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(vec![event(FIRST, EventStatus::Pending)]))
            .when_action(EventBoardAction::EventsLoadFailed {
                error: "status 500".into(),
            })
            .then_state(|state| {
                assert_eq!(state.error.as_deref(), Some(LOAD_EVENTS_FAILED));
                assert!(state.events().is_empty());
                assert_eq!(state.pagination.total_pages(), 0);
            })
            .run();
    }

    #[test]
    fn test_paging_through_twenty_three_events() {
        let events: Vec<Event> = (0..23)
            .map(|day| {
                let at_raw = format!("2024-01-{:02}T10:00:00Z", day + 1);
                event(&at_raw, EventStatus::Pending)
            })
            .collect();

        ReducerTest::new(EventBoardReducer::new())
            .with_env(env())
            .given_state(board(events))
            .when_action(EventBoardAction::NextPage)
            .when_action(EventBoardAction::NextPage)
            .when_action(EventBoardAction::NextPage)
            .then_state(|state| {
                assert_eq!(state.pagination.current_page(), 3);
                assert_eq!(state.page_events().len(), 3);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_success_message_renders_status_with_spaces() {
        assert_eq!(
            status_updated_message(EventStatus::InProgress),
            "Event updated to in progress"
        );
        assert_eq!(
            status_updated_message(EventStatus::Completed),
            "Event updated to completed"
        );
    }
}

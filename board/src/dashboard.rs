//! Dashboard: aggregate counters and the schedule listing.

use std::sync::Arc;
use taskboard_client::{DashboardMetrics, Schedule, ScheduleApi};
use taskboard_core::effect::Effect;
use taskboard_core::reducer::Reducer;
use taskboard_core::{smallvec, SmallVec};

/// Banner shown when the dashboard cannot be loaded
pub const LOAD_DASHBOARD_FAILED: &str = "Failed to load dashboard metrics. Please try again later.";

/// Dashboard state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardState {
    /// Aggregate counters; zero until loaded or when they could not be fetched
    pub metrics: DashboardMetrics,
    /// Schedule listing
    pub schedules: Vec<Schedule>,
    /// Whether a load is in flight
    pub loading: bool,
    /// Page-level error banner
    pub error: Option<String>,
}

/// Dashboard actions
#[derive(Clone, Debug, PartialEq)]
pub enum DashboardAction {
    /// Fetch counters, then schedules
    Load,
    /// Both fetched
    Loaded {
        /// Aggregate counters
        metrics: DashboardMetrics,
        /// Schedule listing
        schedules: Vec<Schedule>,
    },
    /// Either fetch failed
    LoadFailed {
        /// Raw error, for logs only
        error: String,
        /// Counters, when only the schedule listing failed
        metrics: Option<DashboardMetrics>,
    },
}

/// Dashboard dependencies
#[derive(Clone)]
pub struct DashboardEnvironment {
    /// Schedule store
    pub api: Arc<dyn ScheduleApi>,
}

/// Reducer for the dashboard
#[derive(Clone, Copy, Debug, Default)]
pub struct DashboardReducer;

impl Reducer for DashboardReducer {
    type State = DashboardState;
    type Action = DashboardAction;
    type Environment = DashboardEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            DashboardAction::Load => {
                state.loading = true;
                let api = Arc::clone(&env.api);
                smallvec![Effect::future(async move {
                    let metrics = match api.dashboard_metrics().await {
                        Ok(metrics) => metrics,
                        Err(error) => {
                            return Some(DashboardAction::LoadFailed {
                                error: error.to_string(),
                                metrics: None,
                            });
                        },
                    };
                    Some(match api.list_schedules().await {
                        Ok(schedules) => DashboardAction::Loaded { metrics, schedules },
                        Err(error) => DashboardAction::LoadFailed {
                            error: error.to_string(),
                            metrics: Some(metrics),
                        },
                    })
                })]
            },
            DashboardAction::Loaded { metrics, schedules } => {
                tracing::debug!(schedules = schedules.len(), "Dashboard loaded");
                state.loading = false;
                state.error = None;
                state.metrics = metrics;
                state.schedules = schedules;
                smallvec![Effect::None]
            },
            DashboardAction::LoadFailed { error, metrics } => {
                tracing::error!(
                    %error,
                    metrics_fetched = metrics.is_some(),
                    "Failed to load dashboard"
                );
                metrics::counter!("dashboard.load.failed").increment(1);
                state.loading = false;
                state.error = Some(LOAD_DASHBOARD_FAILED.to_string());
                state.metrics = metrics.unwrap_or_default();
                state.schedules.clear();
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use taskboard_client::{MockScheduleApi, Operation, ScheduleId};
    use taskboard_runtime::Store;
    use taskboard_testing::{assertions, ReducerTest};
    use std::time::Duration;

    fn schedule(id: &str) -> Schedule {
        Schedule {
            id: ScheduleId::new(id),
            task_name: format!("Task {id}"),
            rrule: None,
            frequency: None,
            start_date: None,
            end_date: None,
            total_events: 4,
            created_at: None,
        }
    }

    fn metrics() -> DashboardMetrics {
        DashboardMetrics {
            completed: 1,
            in_progress: 2,
            overdue: 3,
            total_events: 10,
        }
    }

    #[test]
    fn test_load_failure_zeroes_data() {
        let loaded = DashboardState {
            metrics: metrics(),
            schedules: vec![schedule("1")],
            loading: true,
            error: None,
        };

        ReducerTest::new(DashboardReducer)
            .with_env(DashboardEnvironment {
                api: MockScheduleApi::new().shared(),
            })
            .given_state(loaded)
            .when_action(DashboardAction::LoadFailed {
                error: "status 500".into(),
                metrics: None,
            })
            .then_state(|state| {
                assert_eq!(state.error.as_deref(), Some(LOAD_DASHBOARD_FAILED));
                assert_eq!(state.metrics, DashboardMetrics::default());
                assert!(state.schedules.is_empty());
                assert!(!state.loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_listing_failure_keeps_fetched_metrics() {
        ReducerTest::new(DashboardReducer)
            .with_env(DashboardEnvironment {
                api: MockScheduleApi::new().shared(),
            })
            .given_state(DashboardState {
                schedules: vec![schedule("1")],
                loading: true,
                ..DashboardState::default()
            })
            .when_action(DashboardAction::LoadFailed {
                error: "status 502".into(),
                metrics: Some(metrics()),
            })
            .then_state(|state| {
                assert_eq!(state.error.as_deref(), Some(LOAD_DASHBOARD_FAILED));
                assert_eq!(state.metrics, metrics());
                assert!(state.schedules.is_empty());
                assert!(!state.loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_load_fetches_metrics_and_schedules() {
        let api = MockScheduleApi::new()
            .with_metrics(metrics())
            .with_schedules(vec![schedule("1"), schedule("2")]);
        let store = Store::new(
            DashboardState::default(),
            DashboardReducer,
            DashboardEnvironment { api: api.shared() },
        );

        let result = store
            .send_and_wait_for(
                DashboardAction::Load,
                |action| matches!(action, DashboardAction::Loaded { .. }),
                Duration::from_secs(1),
            )
            .await;
        assert!(result.is_ok());

        let state = store.state(Clone::clone).await;
        assert_eq!(state.metrics, metrics());
        assert_eq!(state.schedules.len(), 2);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_metrics_failure_skips_schedules() {
        let api = MockScheduleApi::new().with_schedules(vec![schedule("1")]);
        api.fail(Operation::DashboardMetrics);
        let store = Store::new(
            DashboardState::default(),
            DashboardReducer,
            DashboardEnvironment { api: api.shared() },
        );

        store
            .send_and_wait_for(
                DashboardAction::Load,
                |action| matches!(action, DashboardAction::LoadFailed { .. }),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(api.calls(Operation::ListSchedules), 0);
        assert_eq!(
            store.state(|s| s.error.clone()).await.as_deref(),
            Some(LOAD_DASHBOARD_FAILED)
        );
    }

    #[tokio::test]
    async fn test_schedules_failure_reports_fetched_metrics() {
        let api = MockScheduleApi::new()
            .with_metrics(metrics())
            .with_schedules(vec![schedule("1")]);
        api.fail(Operation::ListSchedules);
        let store = Store::new(
            DashboardState::default(),
            DashboardReducer,
            DashboardEnvironment { api: api.shared() },
        );

        let action = store
            .send_and_wait_for(
                DashboardAction::Load,
                |action| matches!(action, DashboardAction::LoadFailed { .. }),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert!(matches!(
            action,
            DashboardAction::LoadFailed { metrics: Some(m), .. } if m == metrics()
        ));
        let state = store.state(Clone::clone).await;
        assert_eq!(state.metrics, metrics());
        assert!(state.schedules.is_empty());
        assert_eq!(state.error.as_deref(), Some(LOAD_DASHBOARD_FAILED));
    }
}

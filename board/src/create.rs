//! Schedule creation: validate, submit, then return to the dashboard.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use taskboard_client::{CreatedSchedule, NewSchedule, ScheduleApi, ScheduleId};
use taskboard_core::effect::Effect;
use taskboard_core::reducer::Reducer;
use taskboard_core::{smallvec, SmallVec};

/// Banner shown after the store accepted a new schedule
pub const CREATE_SUCCEEDED: &str = "Schedule created successfully!";

/// Banner shown when the store rejected a new schedule
pub const CREATE_FAILED: &str = "Failed to create schedule. Please try again.";

/// Pages of the client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Metrics and schedule listing
    Dashboard,
    /// Schedule creation form
    CreateSchedule,
    /// Event board of one schedule
    Events(ScheduleId),
}

impl Route {
    /// Path of the page
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Dashboard => "/dashboard".to_string(),
            Self::CreateSchedule => "/create".to_string(),
            Self::Events(id) => format!("/schedules/{id}/events"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Creation form state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateScheduleState {
    /// Whether a submission is in flight
    pub submitting: bool,
    /// Success banner
    pub success: Option<String>,
    /// Error banner
    pub error: Option<String>,
    /// Schedule reported back by the store
    pub created: Option<CreatedSchedule>,
    /// Page to navigate to, once the redirect delay has passed
    pub navigation: Option<Route>,
}

/// Creation form actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateScheduleAction {
    /// User submitted the form
    Submit(NewSchedule),
    /// Store accepted the schedule
    Created(CreatedSchedule),
    /// Store rejected the schedule or could not be reached
    CreateFailed {
        /// Raw error, for logs only
        error: String,
    },
    /// Redirect delay after a success has passed
    RedirectElapsed,
}

/// Creation form dependencies
#[derive(Clone)]
pub struct CreateScheduleEnvironment {
    /// Schedule store
    pub api: Arc<dyn ScheduleApi>,
    /// Pause between the success banner and the redirect
    pub redirect_delay: Duration,
}

/// Reducer for the creation form
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateScheduleReducer;

impl Reducer for CreateScheduleReducer {
    type State = CreateScheduleState;
    type Action = CreateScheduleAction;
    type Environment = CreateScheduleEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CreateScheduleAction::Submit(request) => {
                if state.submitting {
                    tracing::debug!("Submission already in flight");
                    return smallvec![Effect::None];
                }
                if let Err(invalid) = request.validate() {
                    tracing::debug!(%invalid, "Rejected schedule request");
                    state.success = None;
                    state.error = Some(invalid.to_string());
                    return smallvec![Effect::None];
                }

                tracing::info!(
                    task_name = %request.task_name,
                    frequency = %request.frequency,
                    interval = request.interval,
                    "Submitting schedule"
                );
                state.submitting = true;
                state.error = None;
                state.success = None;

                let api = Arc::clone(&env.api);
                smallvec![Effect::future(async move {
                    match api.create_schedule(request).await {
                        Ok(created) => Some(CreateScheduleAction::Created(created)),
                        Err(error) => Some(CreateScheduleAction::CreateFailed {
                            error: error.to_string(),
                        }),
                    }
                })]
            },
            CreateScheduleAction::Created(created) => {
                tracing::info!(
                    task_name = %created.task_name,
                    total_events = created.total_events,
                    "Schedule created"
                );
                metrics::counter!("schedule.created").increment(1);
                state.submitting = false;
                state.error = None;
                state.success = Some(CREATE_SUCCEEDED.to_string());
                state.created = Some(created);
                smallvec![Effect::Delay {
                    duration: env.redirect_delay,
                    action: Box::new(CreateScheduleAction::RedirectElapsed),
                }]
            },
            CreateScheduleAction::CreateFailed { error } => {
                tracing::error!(%error, "Failed to create schedule");
                metrics::counter!("schedule.create.failed").increment(1);
                state.submitting = false;
                state.success = None;
                state.error = Some(CREATE_FAILED.to_string());
                smallvec![Effect::None]
            },
            CreateScheduleAction::RedirectElapsed => {
                state.navigation = Some(Route::Dashboard);
                smallvec![Effect::None]
            },
        }
    }
}

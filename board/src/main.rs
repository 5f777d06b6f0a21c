//! Taskboard command line client.
//!
//! ```text
//! taskboard dashboard
//! taskboard events <schedule-id> [page]
//! taskboard start <schedule-id> <event-datetime>
//! taskboard complete <schedule-id> <event-datetime>
//! taskboard create <task-name> <start> <end|-> <frequency> <interval> <HH:MM>
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use taskboard::{
    config::Config,
    create::{
        CreateScheduleAction, CreateScheduleEnvironment, CreateScheduleReducer, CreateScheduleState,
    },
    dashboard::{DashboardAction, DashboardEnvironment, DashboardReducer, DashboardState},
    event_board::{EventBoardAction, EventBoardEnvironment, EventBoardReducer, EventBoardState},
    toaster::{ToasterEnvironment, ToasterReducer, ToasterState, ToasterStore},
    view::{CreateScheduleView, DashboardView, EventTableView, ToastListView},
};
use taskboard_client::{EventStatus, Frequency, HttpScheduleApi, NewSchedule, ScheduleApi, ScheduleId};
use taskboard_core::environment::SystemClock;
use taskboard_runtime::Store;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on waiting for a feature to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "taskboard")]
#[command(about = "Recurring-task schedules: dashboard, events and schedule creation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show aggregate counters and the schedule listing
    Dashboard,

    /// List the events of a schedule
    Events {
        /// Schedule id
        schedule_id: String,
        /// Page to show (1-based)
        #[arg(default_value_t = 1)]
        page: usize,
    },

    /// Move an event to in progress
    Start {
        /// Schedule id
        schedule_id: String,
        /// Occurrence timestamp (RFC 3339)
        #[arg(value_parser = parse_event_datetime)]
        event_datetime: DateTime<FixedOffset>,
    },

    /// Move an event to completed
    Complete {
        /// Schedule id
        schedule_id: String,
        /// Occurrence timestamp (RFC 3339)
        #[arg(value_parser = parse_event_datetime)]
        event_datetime: DateTime<FixedOffset>,
    },

    /// Create a schedule
    Create(CreateArgs),
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Task display name
    task_name: String,
    /// First day (YYYY-MM-DD)
    start_date: NaiveDate,
    /// Last day (YYYY-MM-DD), or `-` for open-ended
    end_date: EndDate,
    /// HOURLY, DAILY, WEEKLY, MONTHLY or YEARLY (any case)
    frequency: Frequency,
    /// Recurrence step
    interval: u32,
    /// Time of day of each occurrence (HH:MM)
    #[arg(value_parser = parse_time_of_day)]
    time_of_day: NaiveTime,
}

impl From<CreateArgs> for NewSchedule {
    fn from(args: CreateArgs) -> Self {
        Self {
            task_name: args.task_name,
            start_date: args.start_date,
            end_date: args.end_date.0,
            frequency: args.frequency,
            interval: args.interval,
            time_of_day: args.time_of_day,
        }
    }
}

/// End of the date range; `-` leaves it open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct EndDate(Option<NaiveDate>);

impl FromStr for EndDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Self(None));
        }
        s.parse().map(|date| Self(Some(date)))
    }
}

fn parse_event_datetime(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M")
}

async fn show_dashboard(api: Arc<dyn ScheduleApi>) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(
        DashboardState::default(),
        DashboardReducer,
        DashboardEnvironment { api },
    );
    store
        .send_and_wait_for(
            DashboardAction::Load,
            |action| {
                matches!(action, DashboardAction::Loaded { .. } | DashboardAction::LoadFailed { .. })
            },
            SETTLE_TIMEOUT,
        )
        .await?;

    let view = store.state(DashboardView::from_state).await;
    print!("{view}");
    store.shutdown_default().await?;
    Ok(())
}

async fn run_event_board(
    config: &Config,
    api: Arc<dyn ScheduleApi>,
    toaster: &ToasterStore,
    schedule_id: ScheduleId,
    page: usize,
    change: Option<(DateTime<FixedOffset>, EventStatus)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(
        EventBoardState::new(schedule_id, config.board.page_size),
        EventBoardReducer::new(),
        EventBoardEnvironment::new(api, Arc::new(toaster.clone())),
    );

    store
        .send_and_wait_for(
            EventBoardAction::LoadEvents,
            |action| {
                matches!(
                    action,
                    EventBoardAction::EventsLoaded { .. } | EventBoardAction::EventsLoadFailed { .. }
                )
            },
            SETTLE_TIMEOUT,
        )
        .await?;
    store.send(EventBoardAction::GoToPage { page }).await?;

    if let Some((event_datetime, status)) = change {
        let current = store
            .state(|s| s.event(&s.key_at(event_datetime)).map(|event| event.status))
            .await;
        match current {
            None => println!("No event at {event_datetime}"),
            Some(from) if !from.can_transition_to(status) => {
                println!("Cannot move a {} event to {}", from.label(), status.label());
            },
            Some(_) => {
                store
                    .send_and_wait_for(
                        EventBoardAction::ChangeStatus {
                            event_datetime,
                            status,
                        },
                        |action| {
                            matches!(
                                action,
                                EventBoardAction::EventsReconciled { .. }
                                    | EventBoardAction::ReconcileFailed { .. }
                                    | EventBoardAction::StatusUpdateFailed { .. }
                            )
                        },
                        SETTLE_TIMEOUT,
                    )
                    .await?;
            },
        }
    }

    // Let pending notifications reach the toaster before rendering
    store.shutdown(config.runtime.shutdown_timeout()).await?;
    let view = store.state(EventTableView::from_state).await;
    print!("{view}");
    Ok(())
}

async fn create_schedule(
    config: &Config,
    api: Arc<dyn ScheduleApi>,
    request: NewSchedule,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(
        CreateScheduleState::default(),
        CreateScheduleReducer,
        CreateScheduleEnvironment {
            api,
            redirect_delay: config.board.redirect_delay(),
        },
    );

    if request.validate().is_err() {
        store.send(CreateScheduleAction::Submit(request)).await?;
    } else {
        store
            .send_and_wait_for(
                CreateScheduleAction::Submit(request),
                |action| {
                    matches!(
                        action,
                        CreateScheduleAction::RedirectElapsed | CreateScheduleAction::CreateFailed { .. }
                    )
                },
                SETTLE_TIMEOUT,
            )
            .await?;
    }

    let view = store.state(CreateScheduleView::from_state).await;
    print!("{view}");
    store.shutdown(config.runtime.shutdown_timeout()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    info!(
        base_url = %config.api.base_url,
        page_size = config.board.page_size,
        "Configuration loaded"
    );

    let api: Arc<dyn ScheduleApi> = Arc::new(HttpScheduleApi::with_timeout(
        &config.api.base_url,
        config.api.request_timeout(),
    )?);

    let toaster: ToasterStore = Store::new(
        ToasterState::default(),
        ToasterReducer,
        ToasterEnvironment::new(Arc::new(SystemClock), config.board.toast_duration()),
    );

    match cli.command {
        Command::Dashboard => show_dashboard(api).await?,
        Command::Events { schedule_id, page } => {
            run_event_board(&config, api, &toaster, ScheduleId::new(schedule_id), page, None).await?;
        },
        Command::Start {
            schedule_id,
            event_datetime,
        } => {
            let change = Some((event_datetime, EventStatus::InProgress));
            run_event_board(&config, api, &toaster, ScheduleId::new(schedule_id), 1, change).await?;
        },
        Command::Complete {
            schedule_id,
            event_datetime,
        } => {
            let change = Some((event_datetime, EventStatus::Completed));
            run_event_board(&config, api, &toaster, ScheduleId::new(schedule_id), 1, change).await?;
        },
        Command::Create(args) => create_schedule(&config, api, args.into()).await?,
    }

    let toasts = toaster.state(ToastListView::from_state).await;
    print!("{toasts}");
    toaster.shutdown(config.runtime.shutdown_timeout()).await?;

    info!("Done");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap/panic
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("taskboard").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_events_page_defaults_to_one() {
        match parse(&["events", "42"]).unwrap().command {
            Command::Events { schedule_id, page } => {
                assert_eq!(schedule_id, "42");
                assert_eq!(page, 1);
            },
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["events", "42", "3"]).unwrap().command {
            Command::Events { page, .. } => assert_eq!(page, 3),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_complete_keeps_offset() {
        match parse(&["complete", "1", "2024-01-01T10:00:00+02:00"]).unwrap().command {
            Command::Complete { event_datetime, .. } => {
                assert_eq!(event_datetime.offset().local_minus_utc(), 2 * 3600);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_without_end_date() {
        let cli = parse(&["create", "Backups", "2024-01-01", "-", "weekly", "2", "09:30"]).unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let request = NewSchedule::from(args);
        assert_eq!(request.end_date, None);
        assert_eq!(request.frequency, Frequency::Weekly);
        assert_eq!(request.interval, 2);
        assert_eq!(request.time_of_day, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_create_with_end_date() {
        let cli =
            parse(&["create", "Backups", "2024-01-01", "2024-02-01", "DAILY", "1", "18:00"]).unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.end_date, EndDate(NaiveDate::from_ymd_opt(2024, 2, 1)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert_eq!(
            parse(&["start", "1", "yesterday"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["create", "x", "2024-01-01", "-", "fortnightly", "1", "09:00"])
                .unwrap_err()
                .kind(),
            ErrorKind::ValueValidation
        );
        assert_eq!(
            parse(&["create", "x", "2024-01-01", "-", "daily", "1", "9am"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
    }
}

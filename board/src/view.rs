//! Text presentation of the board, the dashboard, the creation form and
//! the toast queue.
//!
//! Views are plain values built from feature state. Their `Display`
//! implementations render what the CLI prints.

use crate::create::{CreateScheduleState, Route};
use crate::dashboard::DashboardState;
use crate::event_board::EventBoardState;
use crate::toaster::{ToastKind, ToasterState};
use chrono::{DateTime, FixedOffset};
use std::fmt;
use taskboard_client::{Event, EventStatus, Schedule};

const DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S %p";
const DATE_FORMAT: &str = "%m/%d/%Y";
const NOT_AVAILABLE: &str = "N/A";

/// Occurrence timestamp as shown in the event table, in the event's own offset
#[must_use]
pub fn format_event_datetime(at: &DateTime<FixedOffset>) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

/// Schedule date as shown on the dashboard
#[must_use]
pub fn format_date(at: Option<&DateTime<FixedOffset>>) -> String {
    at.map_or_else(|| NOT_AVAILABLE.to_string(), |at| at.format(DATE_FORMAT).to_string())
}

// ============================================================================
// Event table
// ============================================================================

/// Colour family of a status label
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    /// Completed
    Success,
    /// In progress
    Info,
    /// Pending or overdue
    Warning,
}

impl StatusTone {
    /// Tone of `status`
    #[must_use]
    pub const fn of(status: EventStatus) -> Self {
        match status {
            EventStatus::Completed => Self::Success,
            EventStatus::InProgress => Self::Info,
            EventStatus::Pending | EventStatus::Overdue => Self::Warning,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for StatusTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The control offered for one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionControl {
    /// Move to in-progress
    Start {
        /// A change is in flight for this event
        busy: bool,
    },
    /// Move to completed
    Complete {
        /// A change is in flight for this event
        busy: bool,
    },
    /// Terminal; no action
    CompletedBadge,
}

impl ActionControl {
    /// Control for an event in `status`
    #[must_use]
    pub const fn for_status(status: EventStatus, busy: bool) -> Self {
        match status {
            EventStatus::Pending | EventStatus::Overdue => Self::Start { busy },
            EventStatus::InProgress => Self::Complete { busy },
            EventStatus::Completed => Self::CompletedBadge,
        }
    }

    /// Text of the control
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start { busy: false } => "Start",
            Self::Start { busy: true } => "Starting...",
            Self::Complete { busy: false } => "Complete",
            Self::Complete { busy: true } => "Completing...",
            Self::CompletedBadge => "Completed",
        }
    }

    /// Status the control moves the event to
    #[must_use]
    pub const fn target(self) -> Option<EventStatus> {
        match self {
            Self::Start { .. } => Some(EventStatus::InProgress),
            Self::Complete { .. } => Some(EventStatus::Completed),
            Self::CompletedBadge => None,
        }
    }

    /// Whether the control can be activated
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        match self {
            Self::Start { busy } | Self::Complete { busy } => !busy,
            Self::CompletedBadge => false,
        }
    }
}

impl fmt::Display for ActionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompletedBadge => write!(f, "({})", self.label()),
            _ => write!(f, "[{}]", self.label()),
        }
    }
}

/// One row of the event table
#[derive(Clone, Debug, PartialEq)]
pub struct EventRow {
    /// Occurrence timestamp
    pub event_datetime: DateTime<FixedOffset>,
    /// Formatted timestamp
    pub when: String,
    /// Displayed status
    pub status: EventStatus,
    /// Status with hyphens as spaces
    pub status_label: String,
    /// Colour family of the status
    pub tone: StatusTone,
    /// Offered control
    pub action: ActionControl,
}

impl EventRow {
    fn new(event: &Event, busy: bool) -> Self {
        Self {
            event_datetime: event.event_datetime,
            when: format_event_datetime(&event.event_datetime),
            status: event.status,
            status_label: event.status.label(),
            tone: StatusTone::of(event.status),
            action: ActionControl::for_status(event.status, busy),
        }
    }
}

/// The event board page
#[derive(Clone, Debug, PartialEq)]
pub struct EventTableView {
    /// Page title
    pub title: String,
    /// Page-level banner
    pub error: Option<String>,
    /// Rows of the current page
    pub rows: Vec<EventRow>,
    /// Current page
    pub current_page: usize,
    /// Page count
    pub total_pages: usize,
    /// Page links
    pub window: Vec<usize>,
}

impl EventTableView {
    /// Builds the page from board state
    #[must_use]
    pub fn from_state(state: &EventBoardState) -> Self {
        let rows = state
            .page_events()
            .iter()
            .map(|event| EventRow::new(event, state.is_busy(&event.key())))
            .collect();

        Self {
            title: format!("Events for Task ({})", state.task_name().unwrap_or_default()),
            error: state.error.clone(),
            rows,
            current_page: state.pagination.current_page(),
            total_pages: state.pagination.total_pages(),
            window: state.pagination.window().collect(),
        }
    }
}

impl fmt::Display for EventTableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(error) = &self.error {
            writeln!(f, "! {error}")?;
        }
        if self.rows.is_empty() {
            return writeln!(f, "No events found.");
        }
        for row in &self.rows {
            writeln!(
                f,
                "{:<26} {:<12} {:<8} {}",
                row.when,
                row.status_label,
                row.tone.as_str(),
                row.action
            )?;
        }
        let links: Vec<String> = self
            .window
            .iter()
            .map(|page| {
                if *page == self.current_page {
                    format!("[{page}]")
                } else {
                    page.to_string()
                }
            })
            .collect();
        writeln!(
            f,
            "Page {} of {}: {}",
            self.current_page,
            self.total_pages,
            links.join(" ")
        )
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// One aggregate counter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricCard {
    /// Card title
    pub title: &'static str,
    /// Counter value
    pub value: u64,
}

/// One row of the schedule table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRow {
    /// Task name
    pub task_name: String,
    /// Start date or `N/A`
    pub start: String,
    /// End date or `N/A`
    pub end: String,
    /// Frequency or `N/A`
    pub frequency: String,
    /// Occurrence count
    pub total_events: u64,
    /// Path of the schedule's event board
    pub link: String,
}

impl From<&Schedule> for ScheduleRow {
    fn from(schedule: &Schedule) -> Self {
        Self {
            task_name: schedule.task_name.clone(),
            start: format_date(schedule.start_date.as_ref()),
            end: format_date(schedule.end_date.as_ref()),
            frequency: schedule
                .frequency
                .map_or_else(|| NOT_AVAILABLE.to_string(), |frequency| frequency.to_string()),
            total_events: schedule.total_events,
            link: Route::Events(schedule.id.clone()).path(),
        }
    }
}

/// The dashboard page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardView {
    /// Page-level banner
    pub error: Option<String>,
    /// Counters, in display order
    pub cards: [MetricCard; 4],
    /// Schedule table
    pub schedules: Vec<ScheduleRow>,
}

impl DashboardView {
    /// Builds the page from dashboard state
    #[must_use]
    pub fn from_state(state: &DashboardState) -> Self {
        let metrics = state.metrics;
        Self {
            error: state.error.clone(),
            cards: [
                MetricCard {
                    title: "Completed Tasks",
                    value: metrics.completed,
                },
                MetricCard {
                    title: "In Progress Tasks",
                    value: metrics.in_progress,
                },
                MetricCard {
                    title: "Overdue Tasks",
                    value: metrics.overdue,
                },
                MetricCard {
                    title: "Total Events",
                    value: metrics.total_events,
                },
            ],
            schedules: state.schedules.iter().map(ScheduleRow::from).collect(),
        }
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            writeln!(f, "! {error}")?;
        }
        for card in &self.cards {
            writeln!(f, "{:<18} {}", card.title, card.value)?;
        }
        writeln!(f)?;
        if self.schedules.is_empty() {
            return writeln!(f, "No schedules found.");
        }
        for row in &self.schedules {
            writeln!(
                f,
                "{:<24} {:<10} {:<10} {:<8} {:>5}  {}",
                row.task_name, row.start, row.end, row.frequency, row.total_events, row.link
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Creation form and toasts
// ============================================================================

/// Banners of the creation form
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateScheduleView {
    /// Success banner
    pub success: Option<String>,
    /// Error banner
    pub error: Option<String>,
    /// Pending navigation
    pub redirect: Option<String>,
}

impl CreateScheduleView {
    /// Builds the banners from form state
    #[must_use]
    pub fn from_state(state: &CreateScheduleState) -> Self {
        Self {
            success: state.success.clone(),
            error: state.error.clone(),
            redirect: state.navigation.as_ref().map(Route::path),
        }
    }
}

impl fmt::Display for CreateScheduleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(success) = &self.success {
            writeln!(f, "{success}")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "! {error}")?;
        }
        if let Some(path) = &self.redirect {
            writeln!(f, "-> {path}")?;
        }
        Ok(())
    }
}

/// Active toasts, oldest first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToastListView {
    /// `(kind, message)` pairs
    pub toasts: Vec<(ToastKind, String)>,
}

impl ToastListView {
    /// Builds the list from toaster state
    #[must_use]
    pub fn from_state(state: &ToasterState) -> Self {
        Self {
            toasts: state
                .toasts()
                .iter()
                .map(|toast| (toast.kind, toast.message.clone()))
                .collect(),
        }
    }
}

impl fmt::Display for ToastListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, message) in &self.toasts {
            writeln!(f, "[{kind}] {message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use taskboard_client::{DashboardMetrics, Frequency, ScheduleId};

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

    #[test]
    fn test_action_per_status() {
        let table = [
            (EventStatus::Pending, "Start", "Starting...", Some(EventStatus::InProgress)),
            (EventStatus::Overdue, "Start", "Starting...", Some(EventStatus::InProgress)),
            (EventStatus::InProgress, "Complete", "Completing...", Some(EventStatus::Completed)),
            (EventStatus::Completed, "Completed", "Completed", None),
        ];

        for (status, idle, busy, target) in table {
            let control = ActionControl::for_status(status, false);
            assert_eq!(control.label(), idle);
            assert_eq!(control.target(), target);
            assert_eq!(control.is_enabled(), target.is_some());

            let control = ActionControl::for_status(status, true);
            assert_eq!(control.label(), busy);
            assert!(!control.is_enabled());
        }
    }

    #[test]
    fn test_status_tones() {
        assert_eq!(StatusTone::of(EventStatus::Completed), StatusTone::Success);
        assert_eq!(StatusTone::of(EventStatus::InProgress), StatusTone::Info);
        assert_eq!(StatusTone::of(EventStatus::Pending), StatusTone::Warning);
        assert_eq!(StatusTone::of(EventStatus::Overdue), StatusTone::Warning);
    }

    #[test]
    fn test_datetime_keeps_event_offset() {
        assert_eq!(
            format_event_datetime(&at("2024-03-05T14:05:09+02:00")),
            "03/05/2024 14:05:09 PM"
        );
        assert_eq!(format_date(None), "N/A");
    }

    #[test]
    fn test_event_table() {
        let state = EventBoardState::new(ScheduleId::new("1"), 10).with_events(vec![
            event("2024-01-01T10:00:00Z", EventStatus::InProgress),
            event("2024-01-02T10:00:00Z", EventStatus::Completed),
        ]);

        let view = EventTableView::from_state(&state);
        assert_eq!(view.title, "Events for Task (Water plants)");
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].status_label, "in progress");
        assert_eq!(view.rows[0].action, ActionControl::Complete { busy: false });
        assert_eq!(view.window, vec![1]);

        let text = view.to_string();
        assert!(text.contains("[Complete]"));
        assert!(text.contains("Page 1 of 1: [1]"));
    }

    #[test]
    fn test_empty_event_table() {
        let state = EventBoardState::new(ScheduleId::new("1"), 10);
        let text = EventTableView::from_state(&state).to_string();
        assert!(text.contains("No events found."));
    }

    #[test]
    fn test_dashboard_view() {
        let state = DashboardState {
            metrics: DashboardMetrics {
                completed: 3,
                in_progress: 1,
                overdue: 2,
                total_events: 9,
            },
            schedules: vec![Schedule {
                id: ScheduleId::new("42"),
                task_name: "Backups".into(),
                rrule: None,
                frequency: Some(Frequency::Daily),
                start_date: Some(at("2024-01-01T00:00:00Z")),
                end_date: None,
                total_events: 9,
                created_at: None,
            }],
            loading: false,
            error: None,
        };

        let view = DashboardView::from_state(&state);
        let titles: Vec<_> = view.cards.iter().map(|card| card.title).collect();
        assert_eq!(
            titles,
            vec!["Completed Tasks", "In Progress Tasks", "Overdue Tasks", "Total Events"]
        );
        assert_eq!(view.cards[3].value, 9);
        assert_eq!(view.schedules[0].start, "01/01/2024");
        assert_eq!(view.schedules[0].end, "N/A");
        assert_eq!(view.schedules[0].link, "/schedules/42/events");
    }

    #[test]
    fn test_empty_dashboard() {
        let text = DashboardView::from_state(&DashboardState::default()).to_string();
        assert!(text.contains("No schedules found."));
        assert!(text.contains("Total Events"));
    }
}

//! Schedule and event entities as exchanged with the schedule store.

use crate::error::ValidationError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier of a schedule, assigned by the store
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(String);

impl ScheduleId {
    /// Creates a schedule id from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScheduleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Client-side identity of an event occurrence.
///
/// The store guarantees no surrogate id, so an occurrence is identified by
/// its instant within its schedule. Two timestamps naming the same instant
/// in different offsets are the same key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventKey {
    /// Owning schedule
    pub schedule_id: ScheduleId,
    /// Occurrence instant
    pub event_datetime: DateTime<Utc>,
}

impl EventKey {
    /// Builds a key from a schedule and an occurrence timestamp in any offset
    #[must_use]
    pub fn new(schedule_id: ScheduleId, event_datetime: DateTime<FixedOffset>) -> Self {
        Self {
            schedule_id,
            event_datetime: event_datetime.with_timezone(&Utc),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.schedule_id, self.event_datetime.to_rfc3339())
    }
}

// ============================================================================
// Event status state machine
// ============================================================================

/// Lifecycle status of an event occurrence
///
/// ```text
/// pending ──┐
///           ├──> in-progress ──> completed
/// overdue ──┘
/// ```
///
/// `overdue` is assigned by the store; the client never moves an event into
/// it and never moves an event backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    /// Not started yet
    Pending,
    /// Not started and past its scheduled time
    Overdue,
    /// Started by the user
    InProgress,
    /// Done (terminal)
    Completed,
}

impl EventStatus {
    /// Wire representation (`in-progress`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Human readable form: hyphens rendered as spaces (`in progress`)
    #[must_use]
    pub fn label(self) -> String {
        self.as_str().replace('-', " ")
    }

    /// The single status a user may move this event to, if any
    #[must_use]
    pub const fn next_target(self) -> Option<Self> {
        match self {
            Self::Pending | Self::Overdue => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Whether a user transition from `self` to `target` is valid
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next_target() == Some(target)
    }

    /// Whether no further transition exists
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.next_target().is_none()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Recurrence frequency of a schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    /// Every N hours
    Hourly,
    /// Every N days
    Daily,
    /// Every N weeks
    Weekly,
    /// Every N months
    Monthly,
    /// Every N years
    Yearly,
}

impl Frequency {
    /// Wire representation (`DAILY`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOURLY" => Ok(Self::Hourly),
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            _ => Err(ValidationError::UnknownFrequency(s.to_string())),
        }
    }
}

/// A recurrence rule over a date range
///
/// Listing endpoints omit some fields, so everything except the id and the
/// task name is optional or defaulted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Store-assigned id
    pub id: ScheduleId,
    /// Task display name
    pub task_name: String,
    /// Encoded recurrence rule
    #[serde(default)]
    pub rrule: Option<String>,
    /// Recurrence frequency; values outside the known set decode as absent
    #[serde(default, deserialize_with = "lenient_frequency::deserialize")]
    pub frequency: Option<Frequency>,
    /// First day of the range
    #[serde(default)]
    pub start_date: Option<DateTime<FixedOffset>>,
    /// Last day of the range
    #[serde(default)]
    pub end_date: Option<DateTime<FixedOffset>>,
    /// Number of occurrences the rule expands to
    #[serde(default)]
    pub total_events: u64,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

mod lenient_frequency {
    use super::Frequency;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Frequency>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| value.parse().ok()))
    }
}

/// One concrete occurrence of a schedule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Surrogate id, when the store provides one (never used for identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owning schedule
    pub schedule_id: ScheduleId,
    /// Occurrence timestamp; unique within the schedule
    pub event_datetime: DateTime<FixedOffset>,
    /// Current status
    pub status: EventStatus,
    /// Denormalized schedule task name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
}

impl Event {
    /// Identity of this occurrence
    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey::new(self.schedule_id.clone(), self.event_datetime)
    }

    /// Whether this occurrence is identified by `key`
    #[must_use]
    pub fn matches(&self, key: &EventKey) -> bool {
        self.schedule_id == key.schedule_id && self.event_datetime == key.event_datetime
    }
}

/// Aggregate counters shown on the dashboard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardMetrics {
    /// Completed occurrences
    pub completed: u64,
    /// Occurrences in progress
    pub in_progress: u64,
    /// Overdue occurrences
    pub overdue: u64,
    /// All occurrences across all schedules
    pub total_events: u64,
}

/// Request body for creating a schedule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchedule {
    /// Task display name
    pub task_name: String,
    /// First day of the range
    pub start_date: NaiveDate,
    /// Last day of the range (open-ended when absent)
    pub end_date: Option<NaiveDate>,
    /// Recurrence frequency
    pub frequency: Frequency,
    /// Recurrence step, at least 1
    pub interval: u32,
    /// Time of day of each occurrence, sent as `HH:MM`
    #[serde(with = "hour_minute")]
    pub time_of_day: NaiveTime,
}

impl NewSchedule {
    /// Checks that the request is well formed before it is sent
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.task_name.trim().is_empty() {
            return Err(ValidationError::EmptyTaskName);
        }
        if self.interval == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }
}

mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// What the store reports back after creating a schedule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSchedule {
    /// Store-assigned id, when reported
    #[serde(default)]
    pub id: Option<ScheduleId>,
    /// Task display name
    pub task_name: String,
    /// Number of occurrences the rule expands to
    #[serde(default)]
    pub total_events: u64,
}

/// Body of an event status patch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Owning schedule
    pub schedule_id: ScheduleId,
    /// Occurrence timestamp (RFC 3339)
    pub event_datetime: DateTime<FixedOffset>,
    /// Requested status
    pub status: EventStatus,
}

impl StatusUpdate {
    /// Identity of the targeted occurrence
    #[must_use]
    pub fn key(&self) -> EventKey {
        EventKey::new(self.schedule_id.clone(), self.event_datetime)
    }
}

/// Envelope of the event listing endpoint
#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventsEnvelope {
    #[serde(default)]
    pub events: Option<Vec<Event>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    #[test]
    fn test_status_machine() {
        assert_eq!(EventStatus::Pending.next_target(), Some(EventStatus::InProgress));
        assert_eq!(EventStatus::Overdue.next_target(), Some(EventStatus::InProgress));
        assert_eq!(EventStatus::InProgress.next_target(), Some(EventStatus::Completed));
        assert_eq!(EventStatus::Completed.next_target(), None);

        assert!(EventStatus::Pending.can_transition_to(EventStatus::InProgress));
        assert!(!EventStatus::Pending.can_transition_to(EventStatus::Completed));
        assert!(!EventStatus::InProgress.can_transition_to(EventStatus::Pending));
        assert!(!EventStatus::Completed.can_transition_to(EventStatus::InProgress));
        assert!(EventStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_wire_format_and_label() {
        let json = serde_json::to_string(&EventStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(EventStatus::InProgress.label(), "in progress");
        assert_eq!(EventStatus::Overdue.label(), "overdue");

        let parsed: Result<EventStatus, _> = serde_json::from_str("\"in_progress\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_event_key_ignores_offset() {
        let event = Event {
            id: None,
            schedule_id: ScheduleId::new("s1"),
            event_datetime: at("2024-01-01T12:00:00+02:00"),
            status: EventStatus::Pending,
            task_name: None,
        };
        let key = EventKey::new(ScheduleId::new("s1"), at("2024-01-01T10:00:00Z"));
        assert_eq!(event.key(), key);
        assert!(event.matches(&key));

        let other_schedule = EventKey::new(ScheduleId::new("s2"), at("2024-01-01T10:00:00Z"));
        assert!(!event.matches(&other_schedule));
    }

    #[test]
    fn test_event_decodes_store_payload() {
        let event: Event = serde_json::from_str(
            r#"{"id":"","schedule_id":"42","event_datetime":"2024-01-01T10:00:00Z","status":"overdue","task_name":"Water plants"}"#,
        )
        .unwrap();
        assert_eq!(event.schedule_id.as_str(), "42");
        assert_eq!(event.status, EventStatus::Overdue);
        assert_eq!(event.task_name.as_deref(), Some("Water plants"));
    }

    #[test]
    fn test_schedule_listing_without_optional_fields() {
        let schedule: Schedule = serde_json::from_str(
            r#"{"id":"7","task_name":"Backups","total_events":30,"start_date":"2024-01-01T00:00:00Z","end_date":null,"frequency":"DAILY"}"#,
        )
        .unwrap();
        assert_eq!(schedule.frequency, Some(Frequency::Daily));
        assert!(schedule.end_date.is_none());
        assert!(schedule.rrule.is_none());
        assert!(schedule.created_at.is_none());
    }

    #[test]
    fn test_schedule_listing_frequency_is_case_insensitive() {
        let schedules: Vec<Schedule> = serde_json::from_str(
            r#"[
                {"id":"1","task_name":"Backups","frequency":"DAILY"},
                {"id":"2","task_name":"Water plants","frequency":"daily"},
                {"id":"3","task_name":"Payroll","frequency":"fortnightly"},
                {"id":"4","task_name":"Audit","frequency":null},
                {"id":"5","task_name":"Rotate keys"}
            ]"#,
        )
        .unwrap();
        let frequencies: Vec<_> = schedules.iter().map(|s| s.frequency).collect();
        assert_eq!(
            frequencies,
            vec![Some(Frequency::Daily), Some(Frequency::Daily), None, None, None]
        );
    }

    #[test]
    fn test_new_schedule_wire_format() {
        let request = NewSchedule {
            task_name: "Backups".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            frequency: Frequency::Daily,
            interval: 1,
            time_of_day: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["start_date"], "2024-01-01");
        assert_eq!(value["end_date"], "2024-01-31");
        assert_eq!(value["frequency"], "DAILY");
        assert_eq!(value["time_of_day"], "09:30");
    }

    #[test]
    fn test_new_schedule_validation() {
        let valid = NewSchedule {
            task_name: "Backups".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            end_date: None,
            frequency: Frequency::Weekly,
            interval: 2,
            time_of_day: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };
        assert!(valid.validate().is_ok());

        let blank = NewSchedule {
            task_name: "   ".into(),
            ..valid.clone()
        };
        assert_eq!(blank.validate(), Err(ValidationError::EmptyTaskName));

        let zero = NewSchedule {
            interval: 0,
            ..valid.clone()
        };
        assert_eq!(zero.validate(), Err(ValidationError::ZeroInterval));

        let backwards = NewSchedule {
            end_date: NaiveDate::from_ymd_opt(2024, 1, 9),
            ..valid
        };
        assert!(matches!(
            backwards.validate(),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("HOURLY".parse::<Frequency>().unwrap(), Frequency::Hourly);
        assert!(matches!(
            "fortnightly".parse::<Frequency>(),
            Err(ValidationError::UnknownFrequency(_))
        ));
    }

    #[test]
    fn test_metrics_tolerate_missing_fields() {
        let metrics: DashboardMetrics =
            serde_json::from_str(r#"{"completed":3,"total_events":10}"#).unwrap();
        assert_eq!(metrics.completed, 3);
        assert_eq!(metrics.in_progress, 0);
        assert_eq!(metrics.total_events, 10);
    }
}

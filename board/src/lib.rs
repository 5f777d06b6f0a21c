//! # Taskboard
//!
//! Client for a recurring-task schedule store: a dashboard of aggregate
//! counters, a schedule creation form, and a paginated event board whose
//! status changes are applied optimistically.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐   ┌────────────┐   ┌──────────────┐
//!  │ Dashboard  │   │   Create   │   │ Event Board  │──┐
//!  │  Reducer   │   │  Reducer   │   │   Reducer    │  │ Notifier
//!  └─────┬──────┘   └─────┬──────┘   └──────┬───────┘  ▼
//!        │                │                 │     ┌──────────┐
//!        └────────────────┴─────────────────┘     │ Toaster  │
//!                         │                       │  Store   │
//!                    ScheduleApi                  └──────────┘
//!                 (HTTP or in-memory)
//! ```
//!
//! Each feature is a [`Reducer`](taskboard_core::reducer::Reducer) run in
//! its own [`Store`](taskboard_runtime::Store). The toaster store lives for
//! the whole session and is shared through the [`Notifier`] trait.
//!
//! The event board keeps the last list received from the store and a layer
//! of speculative status changes on top ([`overlay`]). A change is shown at
//! once, sent, then either reconciled against a fresh list or rolled back.
//! At most one change per event is in flight.

pub mod config;
pub mod create;
pub mod dashboard;
pub mod event_board;
pub mod overlay;
pub mod pagination;
pub mod toaster;
pub mod view;

pub use config::Config;
pub use create::{
    CreateScheduleAction, CreateScheduleEnvironment, CreateScheduleReducer, CreateScheduleState,
    Route,
};
pub use dashboard::{DashboardAction, DashboardEnvironment, DashboardReducer, DashboardState};
pub use event_board::{
    EventBoardAction, EventBoardEnvironment, EventBoardReducer, EventBoardState,
};
pub use overlay::EventOverlay;
pub use pagination::Paginator;
pub use toaster::{
    Notifier, Toast, ToastId, ToastKind, ToasterAction, ToasterEnvironment, ToasterReducer,
    ToasterState, ToasterStore,
};
pub use view::{ActionControl, DashboardView, EventTableView, StatusTone, ToastListView};

//! Session-scoped toast notifications.
//!
//! The toaster is a feature of its own, run in a dedicated [`Store`] that
//! lives as long as the session. Other features only see the [`Notifier`]
//! trait. Every toast owns a cancellable expiry timer keyed by its id, so
//! toasts expire independently and dismissing one cancels only its timer.

use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use taskboard_core::effect::{Effect, EffectId};
use taskboard_core::environment::Clock;
use taskboard_core::reducer::Reducer;
use taskboard_core::{smallvec, SmallVec};
use taskboard_runtime::Store;
use uuid::Uuid;

/// Default toast lifetime
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Unique toast identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ToastId(Uuid);

impl ToastId {
    /// Generates a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id of the expiry timer owned by this toast
    #[must_use]
    pub fn timer_id(self) -> EffectId {
        EffectId::new(format!("toast-expiry-{}", self.0))
    }
}

impl Default for ToastId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual category of a toast
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastKind {
    /// Positive outcome
    Success,
    /// Failed outcome
    Error,
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A transient notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// Identifier
    pub id: ToastId,
    /// Fixed human-readable message
    pub message: String,
    /// Category
    pub kind: ToastKind,
    /// Time until automatic removal
    pub duration: Duration,
    /// When the toast was enqueued
    pub created_at: DateTime<Utc>,
}

/// Active toasts in insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToasterState {
    toasts: Vec<Toast>,
}

impl ToasterState {
    /// Active toasts, oldest first
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Number of active toasts
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether no toast is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Whether `id` is still active
    #[must_use]
    pub fn contains(&self, id: ToastId) -> bool {
        self.toasts.iter().any(|toast| toast.id == id)
    }

    /// Appends a toast
    pub fn enqueue(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    /// Removes the toast with `id` if still present; removing twice is a no-op
    pub fn expire(&mut self, id: ToastId) -> Option<Toast> {
        let index = self.toasts.iter().position(|toast| toast.id == id)?;
        Some(self.toasts.remove(index))
    }
}

/// Toaster actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToasterAction {
    /// Show a toast; `None` or a zero duration uses the default lifetime
    Enqueue {
        /// Message to show
        message: String,
        /// Category
        kind: ToastKind,
        /// Lifetime override
        duration: Option<Duration>,
    },
    /// Timer fired
    Expire {
        /// Toast to remove
        id: ToastId,
    },
    /// Removed by the user before its timer fired
    Dismiss {
        /// Toast to remove
        id: ToastId,
    },
}

/// Toaster dependencies
#[derive(Clone)]
pub struct ToasterEnvironment {
    /// Clock for toast timestamps
    pub clock: Arc<dyn Clock>,
    /// Lifetime used when an enqueue names none
    pub default_duration: Duration,
}

impl ToasterEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, default_duration: Duration) -> Self {
        Self {
            clock,
            default_duration,
        }
    }
}

/// Reducer for the toast queue
#[derive(Clone, Copy, Debug, Default)]
pub struct ToasterReducer;

impl Reducer for ToasterReducer {
    type State = ToasterState;
    type Action = ToasterAction;
    type Environment = ToasterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ToasterAction::Enqueue {
                message,
                kind,
                duration,
            } => {
                let duration = duration
                    .filter(|duration| !duration.is_zero())
                    .unwrap_or(env.default_duration);
                let id = ToastId::new();

                tracing::debug!(toast_id = %id, %kind, ?duration, "Toast enqueued");
                metrics::counter!("toaster.enqueued", "kind" => kind.to_string()).increment(1);

                state.enqueue(Toast {
                    id,
                    message,
                    kind,
                    duration,
                    created_at: env.clock.now(),
                });

                smallvec![Effect::Delay {
                    duration,
                    action: Box::new(ToasterAction::Expire { id }),
                }
                .cancellable(id.timer_id())]
            },
            ToasterAction::Expire { id } => {
                if state.expire(id).is_none() {
                    tracing::trace!(toast_id = %id, "Toast already gone");
                }
                smallvec![Effect::None]
            },
            ToasterAction::Dismiss { id } => {
                if state.expire(id).is_none() {
                    return smallvec![Effect::None];
                }
                smallvec![Effect::Cancel(id.timer_id())]
            },
        }
    }
}

/// Store running the toaster for a session
pub type ToasterStore = Store<ToasterState, ToasterAction, ToasterEnvironment, ToasterReducer>;

/// Boxed future returned by [`Notifier::notify`]
pub type NotifyFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Sink for user notifications
///
/// Features hold an `Arc<dyn Notifier>` so they stay testable without a
/// toaster store.
pub trait Notifier: Send + Sync {
    /// Shows `message` with the default lifetime
    fn notify(&self, kind: ToastKind, message: String) -> NotifyFuture;
}

impl Notifier for ToasterStore {
    fn notify(&self, kind: ToastKind, message: String) -> NotifyFuture {
        let store = self.clone();
        Box::pin(async move {
            let action = ToasterAction::Enqueue {
                message,
                kind,
                duration: None,
            };
            if let Err(error) = store.send(action).await {
                tracing::warn!(%error, "Dropped notification");
            }
        })
    }
}

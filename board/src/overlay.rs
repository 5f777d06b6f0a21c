//! Two-layer event list: the authoritative snapshot last received from the
//! store, plus speculative status changes keyed by event identity. Readers
//! always see the merge of both layers.

use std::collections::HashMap;
use taskboard_client::{Event, EventKey, EventStatus};

/// Authoritative snapshot with speculative status changes on top
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventOverlay {
    snapshot: Vec<Event>,
    speculative: HashMap<EventKey, EventStatus>,
}

impl EventOverlay {
    /// Creates an overlay over `snapshot` with no speculative changes
    #[must_use]
    pub fn new(snapshot: Vec<Event>) -> Self {
        Self {
            snapshot,
            speculative: HashMap::new(),
        }
    }

    /// The authoritative layer
    #[must_use]
    pub fn snapshot(&self) -> &[Event] {
        &self.snapshot
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Whether a speculative change is pending for `key`
    #[must_use]
    pub fn is_speculative(&self, key: &EventKey) -> bool {
        self.speculative.contains_key(key)
    }

    fn merged(&self, event: &Event) -> Event {
        let mut event = event.clone();
        if let Some(status) = self.speculative.get(&event.key()) {
            event.status = *status;
        }
        event
    }

    /// The merged list, in snapshot order
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.snapshot.iter().map(|event| self.merged(event)).collect()
    }

    /// The merged view of the events in `range` of the list
    #[must_use]
    pub fn events_in(&self, range: std::ops::Range<usize>) -> Vec<Event> {
        self.snapshot
            .get(range)
            .unwrap_or_default()
            .iter()
            .map(|event| self.merged(event))
            .collect()
    }

    /// The merged view of the event identified by `key`
    ///
    /// When the snapshot holds several events with the same key the last one wins.
    #[must_use]
    pub fn event(&self, key: &EventKey) -> Option<Event> {
        self.snapshot
            .iter()
            .rev()
            .find(|event| event.matches(key))
            .map(|event| self.merged(event))
    }

    /// Shows `key` with `status` until it is committed, rolled back or reconciled
    pub fn apply_speculative(&mut self, key: EventKey, status: EventStatus) {
        self.speculative.insert(key, status);
    }

    /// Writes the speculative status of `key` into the snapshot
    ///
    /// Returns the committed status, or `None` if nothing was pending.
    pub fn commit(&mut self, key: &EventKey) -> Option<EventStatus> {
        let status = self.speculative.remove(key)?;
        self.set_snapshot_status(key, status);
        Some(status)
    }

    /// Drops the speculative status of `key` and restores `previous` in the snapshot
    ///
    /// Restoring explicitly keeps the displayed status equal to what it was
    /// before the change even if the snapshot was replaced in between.
    pub fn rollback(&mut self, key: &EventKey, previous: EventStatus) {
        self.speculative.remove(key);
        self.set_snapshot_status(key, previous);
    }

    /// Replaces the snapshot with a fresh list from the store
    ///
    /// The speculative change of `reconciled` is dropped since the new list
    /// is authoritative for it; changes of other keys stay on top.
    pub fn replace_snapshot(&mut self, events: Vec<Event>, reconciled: Option<&EventKey>) {
        self.snapshot = events;
        if let Some(key) = reconciled {
            self.speculative.remove(key);
        }
    }

    fn set_snapshot_status(&mut self, key: &EventKey, status: EventStatus) {
        for event in self.snapshot.iter_mut().filter(|event| event.matches(key)) {
            event.status = status;
        }
    }
}

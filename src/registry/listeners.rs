//! # Listener bindings and the per-event listener table.
//!
//! Each event owns one [`ListenerTable`]: a priority-ordered sequence of
//! callbacks built while modules initialize and frozen before the first
//! firing. Order is priority descending, ties kept in registration order, so
//! dispatch is deterministic for any mix of subscribers.
//!
//! ## Rules
//! - Priorities live in `[-127, 127]`; `i8::MIN` is rejected at subscribe
//!   time.
//! - Insertion keeps the table sorted (O(n) shift per insert; subscription is
//!   a startup-only path).
//! - Freezing swaps the table to a shared snapshot; the dispatch engine walks
//!   that snapshot without holding any lock, so listeners may publish other
//!   events re-entrantly.

use std::sync::Arc;

use crate::dispatch::{FiringScope, Payload};
use crate::error::HubError;
use crate::registry::module::Requirement;

/// Listener callback: receives the firing scope, the publisher's code, and
/// the payload. Captured state replaces the original's `user_data` pointer.
pub type ListenerFn = Arc<dyn Fn(&mut FiringScope<'_>, i64, &Payload) + Send + Sync>;

/// Options for one listen call: how a missing target is treated and where in
/// the table the listener lands.
///
/// ## Example
/// ```
/// use modvisor::{Binding, Requirement};
///
/// let b = Binding::optional().with_priority(20);
/// assert_eq!(b.requirement(), Requirement::Optional);
/// assert_eq!(b.priority(), 20);
/// assert_eq!(Binding::new().priority(), 0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Binding {
    requirement: Requirement,
    priority: i8,
}

impl Binding {
    /// Required target, priority `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Required target, priority `0` (explicit spelling of [`Binding::new`]).
    pub fn required() -> Self {
        Self::default()
    }

    /// Missing target becomes a no-op instead of `NotFound`.
    pub fn optional() -> Self {
        Self {
            requirement: Requirement::Optional,
            priority: 0,
        }
    }

    /// Sets the listener priority (higher runs earlier).
    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the miss behavior.
    #[inline]
    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// Returns the priority.
    #[inline]
    pub fn priority(&self) -> i8 {
        self.priority
    }
}

/// One listener bound to an event.
#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub(crate) module: Arc<str>,
    pub(crate) priority: i8,
    pub(crate) callback: ListenerFn,
}

/// Priority-ordered listener storage for one event.
pub(crate) struct ListenerTable {
    entries: Vec<ListenerEntry>,
    frozen: Option<Arc<[ListenerEntry]>>,
}

impl ListenerTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            frozen: None,
        }
    }

    /// Inserts keeping priority-descending order; equal priorities stay in
    /// registration order.
    pub(crate) fn insert(&mut self, entry: ListenerEntry) -> Result<(), HubError> {
        if self.frozen.is_some() {
            return Err(HubError::RegistrationAfterSeal {
                what: format!("listener from module {}", entry.module),
            });
        }
        let at = self
            .entries
            .partition_point(|e| e.priority >= entry.priority);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Converts the table into an immutable shared snapshot.
    pub(crate) fn freeze(&mut self) {
        if self.frozen.is_none() {
            let entries = std::mem::take(&mut self.entries);
            self.frozen = Some(entries.into());
        }
    }

    /// Returns the frozen snapshot, or `None` before sealing.
    pub(crate) fn snapshot(&self) -> Option<Arc<[ListenerEntry]>> {
        self.frozen.clone()
    }

    pub(crate) fn len(&self) -> usize {
        match &self.frozen {
            Some(snapshot) => snapshot.len(),
            None => self.entries.len(),
        }
    }
}

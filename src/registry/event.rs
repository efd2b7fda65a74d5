//! # Event specs and handles.
//!
//! Defines [`EventSpec`] (what a module registers), the stored
//! [`EventRecord`], and [`EventHandle`], the cheap shared handle used for
//! publishing, listening, and lookups.
//!
//! ## Rules
//! - An event is identified by its owning module plus a local name; the
//!   qualified form is `module:event`.
//! - `interruptible` is fixed at registration; cancel/pause/delay requests
//!   against a non-interruptible event fail at the request call.
//! - The optional interrupt policy is consulted per request and may veto it;
//!   for delays it may also shrink (never grow) the requested duration.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::registry::listeners::ListenerTable;
use crate::registry::module::qualify;

/// Which interrupt a listener is requesting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptKind {
    /// Stop the firing for good; remaining listeners never run.
    Cancel,
    /// Suspend the firing; the requester receives the continuation token.
    Pause,
    /// Suspend the firing with a one-shot timer that resumes it.
    Delay,
}

impl InterruptKind {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            InterruptKind::Cancel => "cancel",
            InterruptKind::Pause => "pause",
            InterruptKind::Delay => "delay",
        }
    }
}

/// Per-event approval callback for interrupt requests.
///
/// Receives the requested kind and, for [`InterruptKind::Delay`], the
/// requested duration (other kinds pass `Duration::ZERO`). Returning `false`
/// vetoes the request; the firing then continues unaffected. The callback may
/// lower the duration to cap how long a delay is allowed to hold the firing.
pub type InterruptPolicy = Arc<dyn Fn(InterruptKind, &mut Duration) -> bool + Send + Sync>;

/// What a module registers to create one event, consumed by
/// [`ModuleSetup::register_event`](crate::ModuleSetup::register_event).
///
/// ## Example
/// ```
/// use modvisor::{EventSpec, InterruptKind};
/// use std::time::Duration;
///
/// // Non-interruptible broadcast:
/// let plain = EventSpec::new("started");
///
/// // Interruptible, with a policy that refuses cancellation and caps delays:
/// let guarded = EventSpec::new("request")
///     .interruptible(true)
///     .with_data_tag("HttpRequest")
///     .with_policy(|kind, max_delay| {
///         if kind == InterruptKind::Delay {
///             *max_delay = (*max_delay).min(Duration::from_secs(5));
///         }
///         kind != InterruptKind::Cancel
///     });
/// # let _ = (plain, guarded);
/// ```
pub struct EventSpec {
    name: Arc<str>,
    interruptible: bool,
    data_tag: Option<Arc<str>>,
    policy: Option<InterruptPolicy>,
}

impl EventSpec {
    /// Creates a non-interruptible event spec with no payload tag.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            interruptible: false,
            data_tag: None,
            policy: None,
        }
    }

    /// Sets whether listeners may cancel/pause/delay firings of this event.
    pub fn interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = interruptible;
        self
    }

    /// Attaches a documentation-only payload type tag (never enforced).
    pub fn with_data_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.data_tag = Some(tag.into());
        self
    }

    /// Attaches the interrupt approval policy.
    pub fn with_policy<F>(mut self, policy: F) -> Self
    where
        F: Fn(InterruptKind, &mut Duration) -> bool + Send + Sync + 'static,
    {
        self.policy = Some(Arc::new(policy));
        self
    }

    /// Returns the local event name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_record(self, module: Arc<str>) -> EventRecord {
        EventRecord {
            module,
            name: self.name,
            interruptible: self.interruptible,
            data_tag: self.data_tag,
            policy: self.policy,
            fired: AtomicU64::new(0),
            listeners: RwLock::new(ListenerTable::new()),
        }
    }
}

/// Stored form of a registered event.
pub(crate) struct EventRecord {
    pub(crate) module: Arc<str>,
    pub(crate) name: Arc<str>,
    pub(crate) interruptible: bool,
    pub(crate) data_tag: Option<Arc<str>>,
    pub(crate) policy: Option<InterruptPolicy>,
    pub(crate) fired: AtomicU64,
    pub(crate) listeners: RwLock<ListenerTable>,
}

/// Shared handle to a registered event.
///
/// Returned by `register_event` and `lookup_event`; cloning is cheap and all
/// clones refer to the same event.
#[derive(Clone)]
pub struct EventHandle {
    pub(crate) record: Arc<EventRecord>,
}

impl EventHandle {
    /// Returns the owning module's name.
    #[inline]
    pub fn module(&self) -> &str {
        &self.record.module
    }

    /// Returns the local event name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Returns the `module:event` form.
    pub fn qualified_name(&self) -> String {
        qualify(&self.record.module, &self.record.name)
    }

    /// Returns whether listeners may interrupt firings of this event.
    #[inline]
    pub fn is_interruptible(&self) -> bool {
        self.record.interruptible
    }

    /// Returns the documentation-only payload tag, if any.
    pub fn data_tag(&self) -> Option<&str> {
        self.record.data_tag.as_deref()
    }

    /// Returns how many times this event has been published (resumptions of
    /// one logical firing are not counted again).
    pub fn fired_count(&self) -> u64 {
        self.record.fired.load(Ordering::Relaxed)
    }

    /// Returns the number of attached listeners.
    pub fn listener_count(&self) -> usize {
        match self.record.listeners.read() {
            Ok(table) => table.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl PartialEq for EventHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

impl Eq for EventHandle {}

impl fmt::Debug for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandle({}:{})", self.record.module, self.record.name)
    }
}

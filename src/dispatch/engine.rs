//! # Dispatch engine: the synchronous listener walk.
//!
//! One firing is one walk over the event's frozen listener snapshot, highest
//! priority first, on the publisher's thread. The walk stops early when a
//! listener's interrupt request is granted; the recorded outcome then decides
//! what the firing turns into:
//!
//! - nothing: every listener ran, the firing completed;
//! - cancelled: the remaining listeners never run;
//! - paused: the continuation lives in the requester's [`PauseToken`];
//! - delayed: the continuation is parked in the suspension manager and a
//!   one-shot timer is armed here, after the walk, so the timer can never
//!   race the walk itself.
//!
//! The snapshot is cloned out of the table lock before the walk begins, so
//! listeners are free to publish further events re-entrantly.
//!
//! [`PauseToken`]: crate::PauseToken

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use tracing::{debug, error};

use crate::core::Hub;
use crate::dispatch::payload::Payload;
use crate::dispatch::scope::{FiringScope, Interrupted};
use crate::registry::{EventHandle, ListenerEntry};

/// Runs one firing of `event` starting at listener index `start`.
///
/// `start` is `0` for a fresh publish and the stored resume index for a
/// redeemed pause or delay. Returns `true` only when the walk reached the end
/// of the table.
pub(crate) fn fire(
    hub: &Hub,
    event: &EventHandle,
    start: usize,
    code: i64,
    payload: Payload,
) -> bool {
    let snapshot = {
        let table = event
            .record
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        table.snapshot()
    };
    // The table is frozen when the registry seals; no snapshot means
    // initialize has not completed yet.
    let Some(entries) = snapshot else {
        hub.usage_error(format!(
            "publish of {} before initialize completed",
            event.qualified_name()
        ));
        return false;
    };

    if start == 0 {
        event.record.fired.fetch_add(1, Ordering::Relaxed);
        debug!(
            publisher = event.module(),
            event = event.name(),
            code,
            listeners = entries.len(),
            "Event firing started"
        );
    } else {
        debug!(
            publisher = event.module(),
            event = event.name(),
            code,
            index = start,
            "Event firing resumed"
        );
    }

    let isolate = hub.config().panic_isolation();
    let mut outcome: Option<Interrupted> = None;
    for (index, entry) in entries.iter().enumerate().skip(start) {
        run_listener(hub, event, entry, index, code, &payload, &mut outcome, isolate);
        if outcome.is_some() {
            break;
        }
    }

    match outcome {
        None => {
            debug!(
                publisher = event.module(),
                event = event.name(),
                "Event firing finished"
            );
            true
        }
        Some(Interrupted::Cancelled { module }) => {
            debug!(
                publisher = event.module(),
                event = event.name(),
                by = %module,
                "Event firing cancelled"
            );
            false
        }
        Some(Interrupted::Paused {
            module,
            reason,
            resume_index,
        }) => {
            debug!(
                publisher = event.module(),
                event = event.name(),
                by = %module,
                reason = %reason,
                resume_index,
                "Event firing paused"
            );
            false
        }
        Some(Interrupted::Delayed {
            module,
            reason,
            id,
            after,
        }) => {
            // Armed only now that the walk has stopped, so the timer cannot
            // fire into a walk still in progress. Holding the hub weakly
            // lets a dropped hub take its pending timers down with it.
            let weak = hub.downgrade();
            let handle = hub.timer().schedule(
                after,
                Box::new(move || {
                    if let Some(hub) = weak.upgrade() {
                        hub.resume_delayed(id);
                    }
                }),
            );
            hub.suspension().attach_timer(id, handle);
            debug!(
                publisher = event.module(),
                event = event.name(),
                by = %module,
                reason = %reason,
                after_ms = after.as_millis() as u64,
                "Event firing delayed"
            );
            false
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_listener(
    hub: &Hub,
    event: &EventHandle,
    entry: &ListenerEntry,
    index: usize,
    code: i64,
    payload: &Payload,
    outcome: &mut Option<Interrupted>,
    isolate: bool,
) {
    if isolate {
        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut scope = FiringScope::new(hub, event, entry, index, code, payload, outcome);
            (entry.callback)(&mut scope, code, payload);
        }));
        if caught.is_err() {
            error!(
                module = %entry.module,
                event = event.name(),
                index,
                "Listener panicked; continuing with the remaining listeners"
            );
        }
    } else {
        let mut scope = FiringScope::new(hub, event, entry, index, code, payload, outcome);
        (entry.callback)(&mut scope, code, payload);
    }
}

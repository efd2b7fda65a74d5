//! # Continuation tokens for suspended firings.
//!
//! A paused firing is represented by a [`PauseToken`] handed to whoever
//! requested the pause. A delayed firing keeps its token inside the
//! suspension manager and hands out a [`DelayId`] instead; either the armed
//! timer or an early [`Hub::resume_delayed`](crate::Hub::resume_delayed) call
//! redeems it, and exactly one of them wins.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::Payload;
use crate::registry::EventHandle;
use crate::suspend::slots::SlotKey;

/// Continuation state of a paused firing.
///
/// Move-only by design: resuming consumes the token, so a firing cannot be
/// resumed twice. Dropping the token abandons the remaining listeners for
/// good; nothing resumes implicitly.
pub struct PauseToken {
    pub(crate) event: EventHandle,
    pub(crate) resume_index: usize,
    pub(crate) code: i64,
    pub(crate) payload: Payload,
    pub(crate) reason: Option<Arc<str>>,
}

impl PauseToken {
    /// Returns the suspended event.
    #[inline]
    pub fn event(&self) -> &EventHandle {
        &self.event
    }

    /// Returns the listener-table index the firing will resume from.
    #[inline]
    pub fn resume_index(&self) -> usize {
        self.resume_index
    }

    /// Returns the publisher's code.
    #[inline]
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Returns the payload the firing was published with.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the reason given at the pause/delay request.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl fmt::Debug for PauseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PauseToken")
            .field("event", &self.event)
            .field("resume_index", &self.resume_index)
            .field("code", &self.code)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Id of a delayed firing held by the suspension manager.
///
/// Copyable on purpose: the requesting listener, the armed timer, and any
/// bookkeeping the embedder does may all hold it. Redeeming it is
/// first-wins; later attempts miss with `NotFound`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelayId(pub(crate) SlotKey);

impl fmt::Debug for DelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DelayId({}.{})", self.0.index, self.0.generation)
    }
}

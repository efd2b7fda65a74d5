//! # Firing scope: what a listener sees and may do mid-firing.
//!
//! A [`FiringScope`] is handed to each listener invocation. It exposes the
//! firing's identity (event, publisher, code, table index) and carries the
//! three interrupt requests. All preconditions from the dispatch state
//! machine are enforced here, at the request call:
//!
//! - the event must be interruptible;
//! - the firing must not already carry an outcome (one interrupt per firing);
//! - the event's interrupt policy, when present, must approve the request
//!   (and may shrink a delay).
//!
//! A granted pause returns the [`PauseToken`] to the requester; a granted
//! delay reserves the suspension slot immediately and returns the
//! [`DelayId`], while the timer itself is armed by the engine only after the
//! dispatch loop stops.

use std::sync::Arc;
use std::time::Duration;

use crate::core::Hub;
use crate::dispatch::Payload;
use crate::error::HubError;
use crate::registry::{EventHandle, InterruptKind, ListenerEntry};
use crate::suspend::{DelayId, PauseToken};

/// Interrupt outcome of one firing, recorded by a granted request.
pub(crate) enum Interrupted {
    Cancelled {
        module: Arc<str>,
    },
    Paused {
        module: Arc<str>,
        reason: Arc<str>,
        resume_index: usize,
    },
    Delayed {
        module: Arc<str>,
        reason: Arc<str>,
        id: DelayId,
        after: Duration,
    },
}

/// Listener-side view of the firing currently being dispatched.
pub struct FiringScope<'a> {
    hub: &'a Hub,
    event: &'a EventHandle,
    entry: &'a ListenerEntry,
    index: usize,
    code: i64,
    payload: &'a Payload,
    outcome: &'a mut Option<Interrupted>,
}

impl<'a> FiringScope<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        hub: &'a Hub,
        event: &'a EventHandle,
        entry: &'a ListenerEntry,
        index: usize,
        code: i64,
        payload: &'a Payload,
        outcome: &'a mut Option<Interrupted>,
    ) -> Self {
        Self {
            hub,
            event,
            entry,
            index,
            code,
            payload,
            outcome,
        }
    }

    /// Returns the hub, e.g. for publishing further events from inside a
    /// listener.
    #[inline]
    pub fn hub(&self) -> &Hub {
        self.hub
    }

    /// Returns the event being fired.
    #[inline]
    pub fn event(&self) -> &EventHandle {
        self.event
    }

    /// Returns the publishing module's name.
    #[inline]
    pub fn publisher(&self) -> &str {
        self.event.module()
    }

    /// Returns the module that owns the currently running listener.
    #[inline]
    pub fn module(&self) -> &str {
        &self.entry.module
    }

    /// Returns this listener's index in the event's table.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the publisher's code.
    #[inline]
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Returns the event's documentation-only payload tag.
    pub fn data_tag(&self) -> Option<&str> {
        self.event.data_tag()
    }

    /// Requests that the firing stop for good.
    ///
    /// On success no further listener runs and `publish` returns `false`.
    /// Work already done by earlier listeners is never unwound.
    pub fn request_cancel(&mut self) -> Result<(), HubError> {
        let mut unused = Duration::ZERO;
        self.approve(InterruptKind::Cancel, &mut unused)?;
        *self.outcome = Some(Interrupted::Cancelled {
            module: self.entry.module.clone(),
        });
        Ok(())
    }

    /// Requests that the firing suspend after this listener.
    ///
    /// Returns the continuation token; whoever ends up holding it resumes
    /// the firing with [`Hub::resume_paused`] or abandons it by dropping it.
    pub fn request_pause(
        &mut self,
        reason: impl Into<Arc<str>>,
    ) -> Result<PauseToken, HubError> {
        let mut unused = Duration::ZERO;
        self.approve(InterruptKind::Pause, &mut unused)?;

        let reason: Arc<str> = reason.into();
        let resume_index = self.index + 1;
        *self.outcome = Some(Interrupted::Paused {
            module: self.entry.module.clone(),
            reason: reason.clone(),
            resume_index,
        });
        Ok(PauseToken {
            event: self.event.clone(),
            resume_index,
            code: self.code,
            payload: self.payload.clone(),
            reason: Some(reason),
        })
    }

    /// Requests that the firing suspend and auto-resume after at most
    /// `max_delay`.
    ///
    /// The policy may shrink the duration. The returned id can redeem the
    /// delay early via [`Hub::resume_delayed`]; the armed timer redeems it
    /// otherwise, and exactly one of them wins.
    pub fn request_delay(
        &mut self,
        reason: impl Into<Arc<str>>,
        max_delay: Duration,
    ) -> Result<DelayId, HubError> {
        if max_delay.is_zero() {
            return Err(self.hub.usage_error(format!(
                "delay of {} requested with zero duration",
                self.event.qualified_name()
            )));
        }
        let mut after = max_delay;
        self.approve(InterruptKind::Delay, &mut after)?;
        // A policy may only ever lower the bound.
        let after = after.min(max_delay);

        let reason: Arc<str> = reason.into();
        let resume_index = self.index + 1;
        let token = PauseToken {
            event: self.event.clone(),
            resume_index,
            code: self.code,
            payload: self.payload.clone(),
            reason: Some(reason.clone()),
        };
        let id = match self.hub.suspension().reserve(token) {
            Ok(id) => id,
            Err(err) => {
                self.hub.record_error(&err);
                return Err(err);
            }
        };
        *self.outcome = Some(Interrupted::Delayed {
            module: self.entry.module.clone(),
            reason,
            id,
            after,
        });
        Ok(id)
    }

    /// Shared preconditions plus the event's policy consult.
    fn approve(&self, kind: InterruptKind, delay: &mut Duration) -> Result<(), HubError> {
        if !self.event.is_interruptible() {
            return Err(self.hub.usage_error(format!(
                "event {} is not interruptible",
                self.event.qualified_name()
            )));
        }
        if self.outcome.is_some() {
            return Err(self.hub.usage_error(format!(
                "firing of {} already interrupted",
                self.event.qualified_name()
            )));
        }
        if let Some(policy) = &self.event.record.policy {
            if !policy(kind, delay) {
                return Err(self.hub.usage_error(format!(
                    "{} of {} vetoed by event policy",
                    kind.as_label(),
                    self.event.qualified_name()
                )));
            }
        }
        Ok(())
    }
}

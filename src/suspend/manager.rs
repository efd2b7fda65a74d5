//! # Suspension manager: delayed-firing bookkeeping.
//!
//! Owns every delayed firing between the interrupt request and its
//! resumption. A delay is two steps with distinct owners:
//!
//! 1. the requesting listener reserves a slot and receives the [`DelayId`]
//!    while the firing is still on the stack;
//! 2. after the dispatch loop exits, the engine arms the one-shot timer and
//!    attaches its handle to the slot.
//!
//! Redemption — timer callback or an early manual resume — removes the slot
//! under the lock, so exactly one redeemer obtains the token; the other
//! misses and reports `NotFound`.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::HubError;
use crate::suspend::slots::SlotMap;
use crate::suspend::token::{DelayId, PauseToken};
use crate::timer::{TimerDriver, TimerHandle};

struct DelayEntry {
    token: PauseToken,
    timer: Option<TimerHandle>,
}

pub(crate) struct SuspensionManager {
    slots: Mutex<SlotMap<DelayEntry>>,
    capacity: usize,
    timer: Arc<dyn TimerDriver>,
}

impl SuspensionManager {
    /// `capacity == 0` means unbounded.
    pub(crate) fn new(capacity: usize, timer: Arc<dyn TimerDriver>) -> Self {
        Self {
            slots: Mutex::new(SlotMap::new()),
            capacity,
            timer,
        }
    }

    /// Stores the continuation for a delayed firing and returns its id.
    ///
    /// Fails with `AllocationFailure` when the capacity bound is reached; the
    /// caller treats that as "the delay did not happen" and the firing keeps
    /// running.
    pub(crate) fn reserve(&self, token: PauseToken) -> Result<DelayId, HubError> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.capacity != 0 && slots.len() >= self.capacity {
            return Err(HubError::AllocationFailure {
                what: format!(
                    "delay token for {}: {} firings already suspended",
                    token.event.qualified_name(),
                    slots.len()
                ),
            });
        }
        let key = slots.insert(DelayEntry { token, timer: None });
        Ok(DelayId(key))
    }

    /// Attaches the armed timer to a reserved slot.
    ///
    /// If the slot was already redeemed (a zero-length delay can fire before
    /// the engine gets here), the late handle is cancelled on the spot.
    pub(crate) fn attach_timer(&self, id: DelayId, handle: TimerHandle) {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slots.get_mut(id.0) {
            Some(entry) => entry.timer = Some(handle),
            None => {
                debug!(?id, "timer attached after redemption, cancelling");
                self.timer.cancel(&handle);
            }
        }
    }

    /// Redeems a delayed firing: removes the slot and returns the token plus
    /// the timer handle (if one was armed). `None` means the id already lost
    /// the redemption race or never existed.
    pub(crate) fn take(&self, id: DelayId) -> Option<(PauseToken, Option<TimerHandle>)> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.remove(id.0).map(|entry| (entry.token, entry.timer))
    }

    /// Number of currently suspended firings.
    pub(crate) fn pending(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Drop for SuspensionManager {
    /// Cancels every still-armed timer so pending delays die with the hub.
    fn drop(&mut self) {
        let slots = match self.slots.get_mut() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        for entry in slots.drain() {
            if let Some(handle) = entry.timer {
                self.timer.cancel(&handle);
            }
        }
    }
}

//! Critical-section wrapper for sequencers touched from interrupt context.
//!
//! When `poll` runs from a timer interrupt and button events arrive on the
//! main loop (or the other way round), every piece of sequencer state has to
//! live in one mutual-exclusion domain. Otherwise an event-driven transition
//! and a deadline-driven one can interleave, double-starting a chain or
//! skipping the failsafe.

use core::cell::RefCell;
use critical_section::Mutex;

use crate::actuator::{Actuators, AudioCue};
use crate::event::{ButtonEvent, EventOutcome};
use crate::machine::{Guards, PowerState};
use crate::sequencer::{PollReport, PropSequencer};
use crate::time::TimeSource;

/// A value guarded by a critical section.
pub struct SharedSequencer<S> {
    inner: Mutex<RefCell<S>>,
}

impl<S> SharedSequencer<S> {
    /// Wraps `sequencer`.
    pub const fn new(sequencer: S) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(sequencer)),
        }
    }

    /// Runs `f` with exclusive access inside a critical section.
    ///
    /// # Panics
    /// Panics if called re-entrantly from within `f`.
    pub fn lock<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Consumes the wrapper and returns the sequencer.
    pub fn into_inner(self) -> S {
        self.inner.into_inner().into_inner()
    }
}

impl<'t, H, T, G> SharedSequencer<PropSequencer<'t, H, T, G>>
where
    H: Actuators + AudioCue,
    T: TimeSource,
    G: Guards,
{
    /// Polls inside a critical section.
    pub fn poll(&self) -> PollReport {
        self.lock(|sequencer| sequencer.poll())
    }

    /// Handles a button event inside a critical section.
    pub fn handle_event(&self, event: ButtonEvent) -> EventOutcome {
        self.lock(|sequencer| sequencer.handle_event(event))
    }

    /// Reads the power state inside a critical section.
    pub fn state(&self) -> PowerState {
        self.lock(|sequencer| sequencer.state())
    }
}

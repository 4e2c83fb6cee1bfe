//! Deadline slots and the keyed slot table.
//!
//! A [`Deadline`] is a single one-shot point in time. The [`SlotTable`] holds
//! one deadline per [`SlotKind`] and is the only place the sequencer compares
//! timestamps, so the wraparound rule lives here and nowhere else.

use crate::time::{Duration, Timestamp};
use heapless::Vec;

/// Number of slots in a [`SlotTable`].
pub const SLOT_COUNT: usize = 6;

/// Slots fired by one [`SlotTable::take_due`] call, in firing order.
pub type FiredSlots = Vec<SlotKind, SLOT_COUNT>;

/// Identifies a deadline slot and the action bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotKind {
    /// Light the blade, kick the clutch, cue the power-on sound.
    Ignite,
    /// Return the clutch and seat the blade.
    ClutchReturn,
    /// Raise the retraction motor to tighten the blade.
    BladeTighten,
    /// Drop the retraction motor to its holding level.
    BladeTension,
    /// Cue the power-off sound after a retraction.
    SoundOff,
    /// Force everything to rest.
    FailsafeOff,
}

impl SlotKind {
    /// Every slot, in the order they are evaluated on each tick.
    pub const ALL: [SlotKind; SLOT_COUNT] = [
        SlotKind::Ignite,
        SlotKind::ClutchReturn,
        SlotKind::BladeTighten,
        SlotKind::BladeTension,
        SlotKind::SoundOff,
        SlotKind::FailsafeOff,
    ];

    /// The slots making up the ignition chain.
    pub const IGNITION_CHAIN: [SlotKind; 4] = [
        SlotKind::Ignite,
        SlotKind::ClutchReturn,
        SlotKind::BladeTighten,
        SlotKind::BladeTension,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// A single scheduled point in time. `None` means inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    due_at: Option<Timestamp>,
}

impl Deadline {
    /// An inactive deadline.
    pub const IDLE: Deadline = Deadline { due_at: None };

    /// Arms the deadline `delay` after `now`, replacing any pending value.
    #[inline]
    pub fn arm(&mut self, now: Timestamp, delay: Duration) {
        self.due_at = Some(now.wrapping_add(delay));
    }

    /// Deactivates the deadline.
    #[inline]
    pub fn clear(&mut self) {
        self.due_at = None;
    }

    /// Returns the pending due time, if armed.
    #[inline]
    pub fn due_at(&self) -> Option<Timestamp> {
        self.due_at
    }

    /// Returns true if armed.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.due_at.is_some()
    }

    /// Returns true if armed and `now` has reached the due time.
    #[inline]
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.due_at.is_some_and(|due| now.has_reached(due))
    }

    /// Returns true if unarmed or already reached. Used for cooldowns, where an
    /// inactive deadline blocks nothing.
    #[inline]
    pub fn has_elapsed(&self, now: Timestamp) -> bool {
        self.due_at.is_none_or(|due| now.has_reached(due))
    }

    /// Clears the deadline and returns true if it was due.
    #[inline]
    pub fn take_if_due(&mut self, now: Timestamp) -> bool {
        if self.is_due(now) {
            self.due_at = None;
            true
        } else {
            false
        }
    }

    /// Time left until the due time; ZERO if already due, `None` if unarmed.
    pub fn remaining(&self, now: Timestamp) -> Option<Duration> {
        self.due_at.map(|due| {
            if now.has_reached(due) {
                Duration::ZERO
            } else {
                due.duration_since(now)
            }
        })
    }
}

/// Keyed table of deadline slots, one per [`SlotKind`].
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    slots: [Deadline; SLOT_COUNT],
}

impl SlotTable {
    /// Creates a table with every slot inactive.
    pub const fn new() -> Self {
        Self {
            slots: [Deadline::IDLE; SLOT_COUNT],
        }
    }

    /// Sets `kind` to fire `delay` after `now`. Later calls win.
    pub fn schedule(&mut self, kind: SlotKind, now: Timestamp, delay: Duration) {
        self.slots[kind.index()].arm(now, delay);
    }

    /// Deactivates `kind` without firing it.
    pub fn cancel(&mut self, kind: SlotKind) {
        self.slots[kind.index()].clear();
    }

    /// Deactivates every slot.
    pub fn cancel_all(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    /// Returns the pending due time of `kind`.
    pub fn due_at(&self, kind: SlotKind) -> Option<Timestamp> {
        self.slots[kind.index()].due_at()
    }

    /// Returns true if `kind` is armed.
    pub fn is_pending(&self, kind: SlotKind) -> bool {
        self.slots[kind.index()].is_armed()
    }

    /// Returns true if any of `kinds` is armed.
    pub fn any_pending(&self, kinds: &[SlotKind]) -> bool {
        kinds.iter().any(|&kind| self.is_pending(kind))
    }

    /// Clears and returns every slot that is due at `now`.
    ///
    /// All due slots are cleared before the caller runs any action, so a slot
    /// rescheduled by an action is only considered on a later call.
    pub fn take_due(&mut self, now: Timestamp) -> FiredSlots {
        let mut fired = FiredSlots::new();
        for kind in SlotKind::ALL {
            if self.slots[kind.index()].take_if_due(now) {
                // Capacity equals the number of slots.
                let _ = fired.push(kind);
            }
        }
        fired
    }

    /// Smallest remaining delay across all armed slots.
    pub fn next_due(&self, now: Timestamp) -> Option<Duration> {
        self.slots
            .iter()
            .filter_map(|slot| slot.remaining(now))
            .min()
    }
}

//! Wrapping millisecond time for deadline comparison.
//!
//! The host clock is a free-running `u32` millisecond counter that wraps after
//! roughly 49.7 days. Deadlines are compared by interpreting the wrapping
//! difference `now - due` as a signed value, so a deadline armed just before
//! the rollover still fires once the counter has wrapped past it. This holds
//! for any delay up to [`MAX_DELAY`].

/// Longest delay that can be scheduled while keeping comparisons unambiguous.
pub const MAX_DELAY: Duration = Duration(i32::MAX as u32);

/// Trait for abstracting time sources.
pub trait TimeSource {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// A point on the wrapping millisecond clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// The last value before the clock wraps to zero.
    pub const MAX: Timestamp = Timestamp(u32::MAX);

    /// Creates a timestamp from raw milliseconds.
    #[inline]
    pub const fn from_millis(millis: u32) -> Self {
        Timestamp(millis)
    }

    /// Returns the raw millisecond count.
    #[inline]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Adds a duration, wrapping around the end of the clock.
    #[inline]
    pub const fn wrapping_add(self, duration: Duration) -> Self {
        Timestamp(self.0.wrapping_add(duration.0))
    }

    /// Wrapping distance from `earlier` to `self`.
    #[inline]
    pub const fn duration_since(self, earlier: Timestamp) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0))
    }

    /// Returns true once `self` is at or after `deadline`.
    #[inline]
    pub const fn has_reached(self, deadline: Timestamp) -> bool {
        (self.0.wrapping_sub(deadline.0) as i32) >= 0
    }
}

/// A span of milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration(pub u32);

impl Duration {
    /// Zero duration constant.
    pub const ZERO: Duration = Duration(0);

    /// Creates a duration from milliseconds.
    #[inline]
    pub const fn from_millis(millis: u32) -> Self {
        Duration(millis)
    }

    /// Converts duration to milliseconds.
    #[inline]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Saturating addition (clamps at `u32::MAX`).
    #[inline]
    pub const fn saturating_add(self, other: Duration) -> Self {
        Duration(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction (returns ZERO on underflow).
    #[inline]
    pub const fn saturating_sub(self, other: Duration) -> Self {
        Duration(self.0.saturating_sub(other.0))
    }
}

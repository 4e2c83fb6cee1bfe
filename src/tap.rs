//! Windowed short-press counter.

use crate::time::{Duration, Timestamp};

/// Counts taps inside fixed sampling windows.
///
/// The count is handed out and reset at every window boundary, including when
/// it is zero, so each reading covers exactly one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapCounter {
    window: Duration,
    window_start: Timestamp,
    count: u32,
}

impl TapCounter {
    /// Starts the first window at `now`.
    pub const fn new(window: Duration, now: Timestamp) -> Self {
        Self {
            window,
            window_start: now,
            count: 0,
        }
    }

    /// Counts one tap at `now`.
    ///
    /// Any window that finished before `now` is closed first, so the tap is
    /// never credited to a window it missed. Returns the closed window's count
    /// as [`roll`](Self::roll) does.
    pub fn record(&mut self, now: Timestamp) -> Option<u32> {
        let closed = self.roll(now);
        self.count = self.count.saturating_add(1);
        closed
    }

    /// Taps seen so far in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Start of the current window.
    pub fn window_start(&self) -> Timestamp {
        self.window_start
    }

    /// Closes the window if it has run its length.
    ///
    /// Returns the count of the most recently closed window, or `None` while
    /// the window is open. When several windows passed unobserved, the later
    /// ones were empty and the result is zero. Windows stay on their original
    /// grid regardless of when this is called. A zero-length window never
    /// closes.
    pub fn roll(&mut self, now: Timestamp) -> Option<u32> {
        let elapsed = now.duration_since(self.window_start).as_millis();
        let windows = elapsed.checked_div(self.window.as_millis())?;
        if windows == 0 {
            return None;
        }

        let taps = if windows == 1 { self.count } else { 0 };
        self.count = 0;
        self.window_start = self
            .window_start
            .wrapping_add(Duration(windows * self.window.as_millis()));
        Some(taps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_stays_open_until_its_length() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(0));
        assert_eq!(taps.record(Timestamp(10)), None);
        assert_eq!(taps.roll(Timestamp(299)), None);
        assert_eq!(taps.count(), 1);
        assert_eq!(taps.roll(Timestamp(300)), Some(1));
    }

    #[test]
    fn reading_covers_one_window_only() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(0));
        taps.record(Timestamp(0));
        taps.record(Timestamp(150));
        assert_eq!(taps.roll(Timestamp(300)), Some(2));

        taps.record(Timestamp(450));
        assert_eq!(taps.roll(Timestamp(600)), Some(1));
    }

    #[test]
    fn empty_window_still_resets() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(0));
        assert_eq!(taps.roll(Timestamp(300)), Some(0));
        assert_eq!(taps.window_start(), Timestamp(300));
        assert_eq!(taps.roll(Timestamp(450)), None);
    }

    #[test]
    fn window_rolls_across_clock_wrap() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(u32::MAX - 100));
        taps.record(Timestamp(u32::MAX - 50));
        assert_eq!(taps.roll(Timestamp(100)), None);
        assert_eq!(taps.roll(Timestamp(199)), Some(1));
    }

    #[test]
    fn late_tap_closes_the_finished_window_first() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(0));
        assert_eq!(taps.roll(Timestamp(200)), None);

        assert_eq!(taps.record(Timestamp(305)), Some(0));
        assert_eq!(taps.count(), 1);
        assert_eq!(taps.window_start(), Timestamp(300));
        assert_eq!(taps.roll(Timestamp(600)), Some(1));
    }

    #[test]
    fn windows_stay_on_grid_with_late_polls() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(0));
        assert_eq!(taps.roll(Timestamp(310)), Some(0));
        assert_eq!(taps.window_start(), Timestamp(300));
        assert_eq!(taps.roll(Timestamp(600)), Some(0));
        assert_eq!(taps.window_start(), Timestamp(600));
    }

    #[test]
    fn skipped_windows_report_empty() {
        let mut taps = TapCounter::new(Duration(300), Timestamp(0));
        taps.record(Timestamp(100));
        assert_eq!(taps.roll(Timestamp(950)), Some(0));
        assert_eq!(taps.window_start(), Timestamp(900));
        assert_eq!(taps.count(), 0);
    }
}

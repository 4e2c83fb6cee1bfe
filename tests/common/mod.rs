//! Shared test infrastructure for prop-sequencer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use prop_sequencer::{
    Actuators, AudioCue, Command, EventDriven, Guards, Level, OffReason, PollReport,
    PropSequencer, RotationSensor, TimeSource, Timestamp,
};

// ============================================================================
// Mock Hardware
// ============================================================================

/// Everything the sequencer told the hardware, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Command(Command),
    PowerOn,
    PowerOff(OffReason),
}

/// Mock actuators and sound player that record every call
pub struct MockHardware {
    history: heapless::Vec<Record, 256>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            history: heapless::Vec::new(),
        }
    }

    pub fn history(&self) -> &[Record] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn power_on_count(&self) -> usize {
        self.history
            .iter()
            .filter(|record| matches!(record, Record::PowerOn))
            .count()
    }

    pub fn power_off_reasons(&self) -> std::vec::Vec<OffReason> {
        self.history
            .iter()
            .filter_map(|record| match record {
                Record::PowerOff(reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> std::vec::Vec<Command> {
        self.history
            .iter()
            .filter_map(|record| match record {
                Record::Command(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, record: Record) {
        let _ = self.history.push(record);
    }
}

impl Actuators for MockHardware {
    fn set_illumination(&mut self, level: Level) {
        self.record(Record::Command(Command::Illumination(level)));
    }

    fn set_release_actuator(&mut self, extended: bool) {
        self.record(Record::Command(Command::ReleaseActuator(extended)));
    }

    fn set_retraction_motor(&mut self, level: Level) {
        self.record(Record::Command(Command::RetractionMotor(level)));
    }

    fn set_rotation_motor(&mut self, on: bool) {
        self.record(Record::Command(Command::RotationMotor(on)));
    }

    fn set_chassis_spin(&mut self, level: Level) {
        self.record(Record::Command(Command::ChassisSpin(level)));
    }
}

impl AudioCue for MockHardware {
    fn signal_power_on(&mut self) {
        self.record(Record::PowerOn);
    }

    fn signal_power_off(&mut self, reason: OffReason) {
        self.record(Record::PowerOff(reason));
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock millisecond clock with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<Timestamp>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(millis: u32) -> Self {
        Self {
            current_time: core::cell::Cell::new(Timestamp(millis)),
        }
    }

    /// Advance time by the given number of milliseconds, wrapping like hardware
    pub fn advance(&self, millis: u32) {
        let current = self.current_time.get();
        self.current_time.set(Timestamp(current.0.wrapping_add(millis)));
    }

    pub fn set_time(&self, millis: u32) {
        self.current_time.set(Timestamp(millis));
    }

    pub fn millis(&self) -> u32 {
        self.current_time.get().0
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Rotation Sensor
// ============================================================================

/// Rotation sensor returning whatever speed the test sets
pub struct MockSensor {
    pub speed: u16,
}

impl RotationSensor for MockSensor {
    fn speed(&mut self) -> u16 {
        self.speed
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

pub type TestSequencer<'t, G = EventDriven> = PropSequencer<'t, MockHardware, MockTimeSource, G>;

/// Advance one millisecond at a time up to `target`, polling after each step.
///
/// Returns the non-quiet reports with the time they were produced at.
pub fn step_to<G: Guards>(
    sequencer: &mut TestSequencer<'_, G>,
    timer: &MockTimeSource,
    target: u32,
) -> std::vec::Vec<(u32, PollReport)> {
    let mut reports = std::vec::Vec::new();
    while timer.millis() != target {
        timer.advance(1);
        let report = sequencer.poll();
        if !report.is_quiet() {
            reports.push((timer.millis(), report));
        }
    }
    reports
}

/// Times at which `kind` fired in a list of reports.
pub fn fire_times(
    reports: &[(u32, PollReport)],
    kind: prop_sequencer::SlotKind,
) -> std::vec::Vec<u32> {
    reports
        .iter()
        .filter(|(_, report)| report.fired.contains(&kind))
        .map(|(at, _)| *at)
        .collect()
}

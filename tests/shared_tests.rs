//! Integration tests for SharedSequencer

mod common;
use common::*;

use prop_sequencer::{
    Button, ButtonEvent, ButtonMode, Calibration, EventDriven, EventKind, EventOutcome, Level,
    PowerState, PropSequencer, SharedSequencer, SlotKind, Stimulus,
};

#[test]
fn shared_sequencer_forwards_events_and_polls() {
    let timer = MockTimeSource::new();
    let shared = SharedSequencer::new(PropSequencer::new(
        MockHardware::new(),
        &timer,
        Calibration::default(),
        EventDriven,
    ));

    assert_eq!(
        shared.handle_event(ButtonEvent::new(
            Button::Power,
            EventKind::ClickLong,
            ButtonMode::Off
        )),
        EventOutcome::Handled(Stimulus::IgniteRequest)
    );
    assert_eq!(shared.state(), PowerState::On);

    timer.advance(499);
    assert!(shared.poll().is_quiet());

    timer.advance(1);
    let report = shared.poll();
    assert_eq!(report.fired.as_slice(), &[SlotKind::Ignite]);

    let illumination = shared.lock(|sequencer| sequencer.outputs().illumination());
    assert_eq!(illumination, Level(26000));

    let sequencer = shared.into_inner();
    assert_eq!(sequencer.hardware().power_on_count(), 1);
}

#[test]
fn lock_gives_full_access() {
    let timer = MockTimeSource::new();
    let shared = SharedSequencer::new(PropSequencer::new(
        MockHardware::new(),
        &timer,
        Calibration::default(),
        EventDriven,
    ));

    assert!(shared.lock(|sequencer| sequencer.activate()));
    timer.advance(100);
    assert!(shared.lock(|sequencer| sequencer.failsafe()));
    assert_eq!(shared.state(), PowerState::Off);
    assert!(shared.lock(|sequencer| sequencer.outputs().is_at_rest()));
}

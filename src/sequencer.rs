//! Prop sequencer with deadline chains, state management and failsafe.
//!
//! Provides [`PropSequencer`], which owns every deadline slot, the power state,
//! the activation buffer and the tap counter, and drives the prop's actuators
//! from two entry points: [`PropSequencer::poll`], called once per host tick,
//! and [`PropSequencer::handle_event`], called for each debounced button event.
//!
//! Both entry points take `&mut self` and must run on the same execution
//! context. If an interrupt handler needs access as well, wrap the sequencer in
//! [`SharedSequencer`](crate::shared::SharedSequencer).

use crate::actuator::{Actuators, AudioCue, Channel, Command, OffReason, OutputState};
use crate::config::Calibration;
use crate::event::{ButtonEvent, EventOutcome, Keymap, Stimulus};
use crate::machine::{EventDriven, GuardContext, Guards, PowerState, Transition, TransitionCause};
use crate::slot::{Deadline, FiredSlots, SlotKind, SlotTable};
use crate::tap::TapCounter;
use crate::time::{Duration, TimeSource, Timestamp};
use heapless::Vec;
use log::{debug, info, trace, warn};

/// Upper bound on transitions a single poll can take: failsafe, idle retract
/// and one guard-driven edge.
pub const MAX_TRANSITIONS_PER_POLL: usize = 3;

/// Transitions taken during one poll, in order.
pub type Transitions = Vec<Transition, MAX_TRANSITIONS_PER_POLL>;

/// What happened during one [`PropSequencer::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Slots whose actions ran this tick, in firing order.
    pub fired: FiredSlots,

    /// State transitions taken this tick.
    pub transitions: Transitions,

    /// Time until the next pending slot is due, or `None` if nothing is
    /// scheduled. Guards and the tap window still need regular polling.
    pub next_due: Option<Duration>,
}

impl PollReport {
    /// Returns true if nothing fired and no transition was taken.
    pub fn is_quiet(&self) -> bool {
        self.fired.is_empty() && self.transitions.is_empty()
    }
}

/// Sequences a motorized blade prop through ignition, retraction and shutdown.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `H` - Actuator and audio cue implementation
/// * `T` - Time source implementation
/// * `G` - Guard predicates for automatic transitions
pub struct PropSequencer<'t, H, T, G = EventDriven>
where
    H: Actuators + AudioCue,
    T: TimeSource,
    G: Guards,
{
    hardware: H,
    time_source: &'t T,
    guards: G,
    calibration: Calibration,
    keymap: Keymap,
    slots: SlotTable,
    state: PowerState,
    buffer: Deadline,
    taps: TapCounter,
    last_window_taps: u32,
    outputs: OutputState,
    sound_active: bool,
    last_transition: Timestamp,
}

impl<'t, H, T, G> PropSequencer<'t, H, T, G>
where
    H: Actuators + AudioCue,
    T: TimeSource,
    G: Guards,
{
    /// Creates a sequencer in `Off` with every actuator commanded to rest.
    pub fn new(mut hardware: H, time_source: &'t T, calibration: Calibration, guards: G) -> Self {
        for channel in Channel::ALL {
            hardware.apply(channel.rest());
        }

        let now = time_source.now();

        Self {
            hardware,
            time_source,
            guards,
            calibration,
            keymap: Keymap::standard(),
            slots: SlotTable::new(),
            state: PowerState::Off,
            buffer: Deadline::IDLE,
            taps: TapCounter::new(calibration.tap_window(), now),
            last_window_taps: 0,
            outputs: OutputState::at_rest(),
            sound_active: false,
            last_transition: now,
        }
    }

    /// Services the sequencer. Call once per host tick.
    ///
    /// Each call runs, in order:
    /// 1. every due slot, in [`SlotKind::ALL`] order
    /// 2. the tap window roll and idle retract
    /// 3. at most one guard-driven transition
    pub fn poll(&mut self) -> PollReport {
        let now = self.time_source.now();
        let mut transitions = Transitions::new();

        // Drop an elapsed buffer so it cannot look pending again once the
        // clock has wrapped far enough.
        if self.buffer.has_elapsed(now) {
            self.buffer.clear();
        }

        let fired = self.slots.take_due(now);
        for &kind in &fired {
            debug!("slot {:?} fired at {} ms", kind, now.as_millis());
            if let Some(transition) = self.run_slot(kind, now) {
                let _ = transitions.push(transition);
            }
        }

        if let Some(taps) = self.taps.roll(now) {
            if let Some(transition) = self.close_tap_window(taps, now) {
                let _ = transitions.push(transition);
            }
        }

        if let Some(transition) = self.evaluate_guards(now) {
            let _ = transitions.push(transition);
        }

        PollReport {
            fired,
            transitions,
            next_due: self.slots.next_due(now),
        }
    }

    /// Translates a button event through the keymap and applies it.
    ///
    /// # Returns
    /// * `EventOutcome::Handled` - The stimulus took effect
    /// * `EventOutcome::Ignored` - Recognized, but the buffer or state gated it
    /// * `EventOutcome::Unhandled` - Not bound; apply your own default
    pub fn handle_event(&mut self, event: ButtonEvent) -> EventOutcome {
        match self.keymap.translate(&event) {
            Some(stimulus) => self.handle_stimulus(stimulus),
            None => {
                trace!("unbound event {:?}", event);
                EventOutcome::Unhandled
            }
        }
    }

    /// Applies a stimulus directly, bypassing the keymap.
    pub fn handle_stimulus(&mut self, stimulus: Stimulus) -> EventOutcome {
        let accepted = match stimulus {
            Stimulus::IgniteRequest => self.request_ignite(),
            Stimulus::RetractRequest => self.request_retract(),
            Stimulus::Tap => {
                let now = self.time_source.now();
                if let Some(taps) = self.taps.record(now) {
                    // A retract here was already due at the window boundary.
                    let _ = self.close_tap_window(taps, now);
                }
                true
            }
        };

        if accepted {
            EventOutcome::Handled(stimulus)
        } else {
            trace!("{:?} gated in {:?}", stimulus, self.state);
            EventOutcome::Ignored(stimulus)
        }
    }

    /// Starts ignition if `Off` and the activation buffer has elapsed.
    pub fn request_ignite(&mut self) -> bool {
        let now = self.time_source.now();
        if !self.buffer.has_elapsed(now) {
            return false;
        }
        self.ignite(now, TransitionCause::Request).is_some()
    }

    /// Starts retraction if `On` and the activation buffer has elapsed.
    pub fn request_retract(&mut self) -> bool {
        let now = self.time_source.now();
        if !self.buffer.has_elapsed(now) {
            return false;
        }
        self.retract(now, TransitionCause::Request).is_some()
    }

    /// Starts the ignition chain, ignoring the activation buffer.
    ///
    /// No-op returning `false` if already active.
    pub fn activate(&mut self) -> bool {
        let now = self.time_source.now();
        self.ignite(now, TransitionCause::Request).is_some()
    }

    /// Starts the retraction chain, ignoring the activation buffer.
    ///
    /// No-op returning `false` unless `On`.
    pub fn begin_retraction(&mut self) -> bool {
        let now = self.time_source.now();
        self.retract(now, TransitionCause::Request).is_some()
    }

    /// Shuts down and puts every actuator at rest.
    ///
    /// No-op returning `false` if already `Off`; no actuator is written.
    pub fn deactivate(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let now = self.time_source.now();
        self.power_down(now, OffReason::Manual, TransitionCause::Request)
            .is_some()
    }

    /// Runs the failsafe immediately.
    ///
    /// Always rewrites every channel to rest, even when already `Off`. Returns
    /// true if this changed the power state.
    pub fn failsafe(&mut self) -> bool {
        let now = self.time_source.now();
        self.power_down(now, OffReason::Failsafe, TransitionCause::Failsafe)
            .is_some()
    }

    fn run_slot(&mut self, kind: SlotKind, now: Timestamp) -> Option<Transition> {
        let levels = *self.calibration.levels();

        match kind {
            SlotKind::Ignite => {
                self.command(Command::ChassisSpin(levels.chassis_run));
                if !self.sound_active {
                    self.hardware.signal_power_on();
                    self.sound_active = true;
                }
                self.command(Command::Illumination(levels.illumination));
                self.command(Command::ReleaseActuator(true));
                self.slots
                    .schedule(SlotKind::ClutchReturn, now, self.calibration.clutch_hold());
                None
            }
            SlotKind::ClutchReturn => {
                self.command(Command::ReleaseActuator(false));
                self.command(Command::RetractionMotor(levels.seat));
                self.slots
                    .schedule(SlotKind::BladeTighten, now, self.calibration.seat_time());
                None
            }
            SlotKind::BladeTighten => {
                self.command(Command::RetractionMotor(levels.tighten));
                self.slots
                    .schedule(SlotKind::BladeTension, now, self.calibration.tighten_time());
                None
            }
            SlotKind::BladeTension => {
                self.command(Command::RetractionMotor(levels.tension));
                None
            }
            SlotKind::SoundOff => {
                self.sound_off(OffReason::Normal);
                None
            }
            SlotKind::FailsafeOff => {
                if self.state == PowerState::Retracting {
                    info!("retraction ended by failsafe at {} ms", now.as_millis());
                } else {
                    warn!("failsafe fired in {:?} at {} ms", self.state, now.as_millis());
                }
                self.power_down(now, OffReason::Failsafe, TransitionCause::Failsafe)
            }
        }
    }

    fn close_tap_window(&mut self, taps: u32, now: Timestamp) -> Option<Transition> {
        self.last_window_taps = taps;
        if taps == 0
            && self.calibration.idle_retract()
            && self.state.is_extended()
            && self.buffer.has_elapsed(now)
        {
            return self.retract(now, TransitionCause::IdleTimeout);
        }
        None
    }

    fn evaluate_guards(&mut self, now: Timestamp) -> Option<Transition> {
        if !self.buffer.has_elapsed(now) {
            return None;
        }

        let ctx = self.guard_context(now);
        match self.state {
            PowerState::Off => {
                if self.guards.ready_to_ignite(&ctx) {
                    return self.ignite(now, TransitionCause::Guard);
                }
            }
            PowerState::On => {
                if self.guards.ready_to_retract(&ctx) {
                    return self.retract(now, TransitionCause::Guard);
                }
            }
            PowerState::Retracting => {
                if self.guards.ready_to_power_off(&ctx) {
                    return self.power_down(now, OffReason::Normal, TransitionCause::Guard);
                }
            }
        }
        None
    }

    fn guard_context(&self, now: Timestamp) -> GuardContext {
        GuardContext {
            state: self.state,
            now,
            in_state_for: now.duration_since(self.last_transition),
            ignition_complete: !self.slots.any_pending(&SlotKind::IGNITION_CHAIN),
            sound_active: self.sound_active,
            last_window_taps: self.last_window_taps,
        }
    }

    fn ignite(&mut self, now: Timestamp, cause: TransitionCause) -> Option<Transition> {
        if self.state.is_active() {
            return None;
        }

        self.slots
            .schedule(SlotKind::Ignite, now, self.calibration.ignite_delay());
        self.slots
            .schedule(SlotKind::FailsafeOff, now, self.calibration.ignition_failsafe());
        self.buffer.arm(now, self.calibration.ignite_cooldown());

        Some(self.enter(PowerState::On, cause, now))
    }

    fn retract(&mut self, now: Timestamp, cause: TransitionCause) -> Option<Transition> {
        if self.state != PowerState::On {
            return None;
        }

        // A late chain step would override the drive level.
        for kind in SlotKind::IGNITION_CHAIN {
            self.slots.cancel(kind);
        }

        let levels = *self.calibration.levels();
        self.command(Command::ReleaseActuator(false));
        self.command(Command::RotationMotor(true));
        self.command(Command::RetractionMotor(levels.drive));
        self.command(Command::ChassisSpin(levels.chassis_retract));

        self.slots
            .schedule(SlotKind::SoundOff, now, self.calibration.sound_off_delay());
        self.slots
            .schedule(SlotKind::FailsafeOff, now, self.calibration.retraction_failsafe());
        self.buffer.arm(now, self.calibration.retract_cooldown());

        Some(self.enter(PowerState::Retracting, cause, now))
    }

    fn power_down(
        &mut self,
        now: Timestamp,
        reason: OffReason,
        cause: TransitionCause,
    ) -> Option<Transition> {
        let from = self.state;

        self.slots.cancel_all();
        self.rest_all();
        self.sound_off(reason);

        if from == PowerState::Off {
            return None;
        }

        self.buffer.arm(now, self.calibration.power_off_cooldown());
        Some(self.enter(PowerState::Off, cause, now))
    }

    fn enter(&mut self, to: PowerState, cause: TransitionCause, now: Timestamp) -> Transition {
        let transition = Transition {
            from: self.state,
            to,
            cause,
            at: now,
        };

        info!(
            "{:?} -> {:?} ({:?}) at {} ms",
            transition.from,
            transition.to,
            cause,
            now.as_millis()
        );
        self.state = to;
        self.last_transition = now;
        transition
    }

    fn command(&mut self, command: Command) {
        if self.outputs.record(command) {
            self.hardware.apply(command);
        }
    }

    fn rest_all(&mut self) {
        for channel in Channel::ALL {
            let command = channel.rest();
            self.outputs.record(command);
            self.hardware.apply(command);
        }
    }

    fn sound_off(&mut self, reason: OffReason) {
        if self.sound_active {
            self.hardware.signal_power_off(reason);
            self.sound_active = false;
        }
    }

    /// Returns the current power state.
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Returns true while `On` or `Retracting`.
    pub fn is_on(&self) -> bool {
        self.state.is_active()
    }

    /// Returns the last command sent to each channel.
    pub fn outputs(&self) -> &OutputState {
        &self.outputs
    }

    /// Returns true while the power-on cue is live.
    pub fn sound_active(&self) -> bool {
        self.sound_active
    }

    /// Returns when `kind` is due, if pending.
    pub fn pending(&self, kind: SlotKind) -> Option<Timestamp> {
        self.slots.due_at(kind)
    }

    /// Returns true if a transition request would be accepted now.
    pub fn buffer_elapsed(&self) -> bool {
        self.buffer.has_elapsed(self.time_source.now())
    }

    /// Taps counted so far in the open window.
    pub fn tap_count(&self) -> u32 {
        self.taps.count()
    }

    /// Taps counted in the most recently closed window.
    pub fn last_window_taps(&self) -> u32 {
        self.last_window_taps
    }

    /// Returns the active calibration.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Returns the keymap.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Returns the keymap for rebinding.
    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    /// Returns the hardware implementation.
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// Returns the hardware implementation mutably.
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Returns the guard implementation.
    pub fn guards(&self) -> &G {
        &self.guards
    }

    /// Returns the guard implementation mutably.
    pub fn guards_mut(&mut self) -> &mut G {
        &mut self.guards
    }
}

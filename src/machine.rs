//! Power states and the guard predicates that drive automatic transitions.
//!
//! The cycle is `Off -> On -> Retracting -> Off`. Button stimuli can request
//! the first two edges directly; a [`Guards`] implementation decides when the
//! sequencer takes each edge on its own. Every edge has its own named
//! predicate, so a guard that never fires is visible in the implementation
//! rather than hidden in an empty condition.

use crate::time::{Duration, Timestamp};

/// Overall mechanism state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Blade retracted, all actuators at rest.
    #[default]
    Off,
    /// Ignition chain started; blade extended or extending.
    On,
    /// Retraction chain running; blade winding in.
    Retracting,
}

impl PowerState {
    /// True while powered, i.e. `On` or `Retracting`.
    pub fn is_active(&self) -> bool {
        !matches!(self, PowerState::Off)
    }

    /// True while the blade is out.
    pub fn is_extended(&self) -> bool {
        matches!(self, PowerState::On)
    }
}

/// What caused a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionCause {
    /// A button stimulus or a direct API call.
    Request,
    /// A [`Guards`] predicate.
    Guard,
    /// A tap window closed with no taps.
    IdleTimeout,
    /// The failsafe deadline fired.
    Failsafe,
}

/// A state change taken by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: PowerState,
    pub to: PowerState,
    pub cause: TransitionCause,
    pub at: Timestamp,
}

/// Snapshot handed to guard predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GuardContext {
    /// Current state.
    pub state: PowerState,
    /// Current time.
    pub now: Timestamp,
    /// Time since the last transition.
    pub in_state_for: Duration,
    /// No ignition chain step is pending.
    pub ignition_complete: bool,
    /// The power-on sound cue was sent and not yet followed by power-off.
    pub sound_active: bool,
    /// Tap count from the most recently closed window.
    pub last_window_taps: u32,
}

/// Predicates gating the automatic transitions.
///
/// Each predicate is only consulted in its source state and only after the
/// activation buffer has elapsed.
pub trait Guards {
    /// `Off -> On`.
    fn ready_to_ignite(&mut self, ctx: &GuardContext) -> bool;

    /// `On -> Retracting`.
    fn ready_to_retract(&mut self, ctx: &GuardContext) -> bool;

    /// `Retracting -> Off`.
    fn ready_to_power_off(&mut self, ctx: &GuardContext) -> bool;
}

/// No automatic transitions; button stimuli, idle timeout and the failsafe
/// move the state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDriven;

impl Guards for EventDriven {
    fn ready_to_ignite(&mut self, _ctx: &GuardContext) -> bool {
        false
    }

    fn ready_to_retract(&mut self, _ctx: &GuardContext) -> bool {
        false
    }

    fn ready_to_power_off(&mut self, _ctx: &GuardContext) -> bool {
        false
    }
}

/// Runs the full cycle unattended, paced by the chains themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainCompletion;

impl Guards for ChainCompletion {
    // Deliberately unconditional: with no sensor the prop re-ignites as soon
    // as the power-off cooldown runs out.
    fn ready_to_ignite(&mut self, _ctx: &GuardContext) -> bool {
        true
    }

    fn ready_to_retract(&mut self, ctx: &GuardContext) -> bool {
        ctx.ignition_complete
    }

    fn ready_to_power_off(&mut self, ctx: &GuardContext) -> bool {
        !ctx.sound_active
    }
}

/// Powers a retracted blade off once a tap window passes without taps.
///
/// Pair it with a calibration whose idle retract is enabled, such as
/// [`Calibration::spinning_tap_idle`](crate::config::Calibration::spinning_tap_idle):
/// a tap-free window retracts the blade, and once the retract cooldown has
/// run it shuts down if the most recently closed window had no taps. Tapping
/// while retracting keeps the mechanism powered until the failsafe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapIdle;

impl Guards for TapIdle {
    fn ready_to_ignite(&mut self, _ctx: &GuardContext) -> bool {
        false
    }

    // Idle retract is driven by the calibration, not by a guard.
    fn ready_to_retract(&mut self, _ctx: &GuardContext) -> bool {
        false
    }

    fn ready_to_power_off(&mut self, ctx: &GuardContext) -> bool {
        ctx.last_window_taps == 0
    }
}

/// Trait for a chassis rotation speed sensor.
pub trait RotationSensor {
    /// Current rotation speed in sensor units.
    fn speed(&mut self) -> u16;
}

/// Ignites when the chassis spins up and retracts when it slows down.
#[derive(Debug, Clone)]
pub struct SpinGuards<S: RotationSensor> {
    sensor: S,
    spin_up: u16,
    spin_down: u16,
}

impl<S: RotationSensor> SpinGuards<S> {
    /// Ignites at or above `spin_up`, retracts below `spin_down`.
    pub fn new(sensor: S, spin_up: u16, spin_down: u16) -> Self {
        Self {
            sensor,
            spin_up,
            spin_down,
        }
    }

    /// Returns the sensor.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Returns the sensor mutably.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}

impl<S: RotationSensor> Guards for SpinGuards<S> {
    fn ready_to_ignite(&mut self, _ctx: &GuardContext) -> bool {
        self.sensor.speed() >= self.spin_up
    }

    fn ready_to_retract(&mut self, ctx: &GuardContext) -> bool {
        ctx.ignition_complete && self.sensor.speed() < self.spin_down
    }

    fn ready_to_power_off(&mut self, ctx: &GuardContext) -> bool {
        !ctx.sound_active
    }
}

//! Calibration constants for the ignition and retraction chains.
//!
//! Delays and motor levels are physical calibration values, not computed. Use
//! [`Calibration::default`] or one of the prop presets, or adjust individual
//! values with [`CalibrationBuilder`], which validates the result.

use crate::actuator::Level;
use crate::time::{Duration, MAX_DELAY};

/// Names a delay field in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DelayField {
    IgniteDelay,
    ClutchHold,
    SeatTime,
    TightenTime,
    SoundOffDelay,
    IgnitionFailsafe,
    RetractionFailsafe,
    IgniteCooldown,
    RetractCooldown,
    PowerOffCooldown,
    TapWindow,
}

/// Calibration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Delay exceeds [`MAX_DELAY`] and could not be compared across a clock wrap.
    DelayTooLong(DelayField),

    /// Tap window of zero length.
    ZeroTapWindow,

    /// Failsafe fires before the sequence it guards has finished.
    FailsafeTooShort(DelayField),
}

impl core::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CalibrationError::DelayTooLong(field) => {
                write!(f, "{:?} exceeds the maximum schedulable delay", field)
            }
            CalibrationError::ZeroTapWindow => {
                write!(f, "tap window must be longer than zero")
            }
            CalibrationError::FailsafeTooShort(field) => {
                write!(f, "{:?} fires before the sequence it guards completes", field)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CalibrationError {}

/// Motor and LED duty levels used by the chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Levels {
    /// Blade illumination while lit.
    pub illumination: Level,
    /// Retraction motor while the blade seats after the clutch returns.
    pub seat: Level,
    /// Retraction motor while tightening.
    pub tighten: Level,
    /// Retraction motor holding tension while lit.
    pub tension: Level,
    /// Retraction motor while winding the blade in.
    pub drive: Level,
    /// Chassis spin while lit.
    pub chassis_run: Level,
    /// Chassis spin while retracting.
    pub chassis_retract: Level,
}

impl Levels {
    const STANDARD: Levels = Levels {
        illumination: Level(26000),
        seat: Level(3000),
        tighten: Level(4000),
        tension: Level(1500),
        drive: Level(21000),
        chassis_run: Level(1500),
        chassis_retract: Level(3000),
    };
}

/// Validated timing and level calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    ignite_delay: Duration,
    clutch_hold: Duration,
    seat_time: Duration,
    tighten_time: Duration,
    sound_off_delay: Duration,
    ignition_failsafe: Duration,
    retraction_failsafe: Duration,
    ignite_cooldown: Duration,
    retract_cooldown: Duration,
    power_off_cooldown: Duration,
    tap_window: Duration,
    idle_retract: bool,
    levels: Levels,
}

impl Calibration {
    const STANDARD: Calibration = Calibration {
        ignite_delay: Duration(500),
        clutch_hold: Duration(350),
        seat_time: Duration(150),
        tighten_time: Duration(50),
        sound_off_delay: Duration(3000),
        ignition_failsafe: Duration(20_000),
        retraction_failsafe: Duration(5000),
        ignite_cooldown: Duration(2000),
        retract_cooldown: Duration(2000),
        power_off_cooldown: Duration(2000),
        tap_window: Duration(300),
        idle_retract: true,
        levels: Levels::STANDARD,
    };

    /// Creates a builder seeded with the default calibration.
    pub fn builder() -> CalibrationBuilder {
        CalibrationBuilder::new()
    }

    /// Button-driven prop with a spinning chassis and tap-based idle retract.
    pub const fn spinning() -> Self {
        Calibration {
            ignite_delay: Duration(300),
            ignite_cooldown: Duration(6000),
            power_off_cooldown: Duration::ZERO,
            levels: Levels {
                tighten: Level(2000),
                ..Levels::STANDARD
            },
            ..Self::STANDARD
        }
    }

    /// [`spinning`](Self::spinning) with a long cooldown after power-off,
    /// for use with [`TapIdle`](crate::machine::TapIdle) guards.
    pub const fn spinning_tap_idle() -> Self {
        Calibration {
            power_off_cooldown: Duration(15_000),
            ..Self::spinning()
        }
    }

    /// Automatic prop cycling through its states without a chassis motor.
    pub const fn jedi() -> Self {
        Calibration {
            sound_off_delay: Duration(4500),
            retraction_failsafe: Duration(5500),
            ignite_cooldown: Duration(8000),
            power_off_cooldown: Duration(20_000),
            idle_retract: false,
            levels: Levels {
                chassis_run: Level::OFF,
                chassis_retract: Level::OFF,
                ..Levels::STANDARD
            },
            ..Self::STANDARD
        }
    }

    /// Delay from activation to the `Ignite` step.
    pub fn ignite_delay(&self) -> Duration {
        self.ignite_delay
    }

    /// How long the clutch stays extended.
    pub fn clutch_hold(&self) -> Duration {
        self.clutch_hold
    }

    /// Seat phase before tightening.
    pub fn seat_time(&self) -> Duration {
        self.seat_time
    }

    /// Tighten phase before settling on tension.
    pub fn tighten_time(&self) -> Duration {
        self.tighten_time
    }

    /// Delay from retraction start to the power-off sound cue.
    pub fn sound_off_delay(&self) -> Duration {
        self.sound_off_delay
    }

    /// Failsafe armed on activation.
    pub fn ignition_failsafe(&self) -> Duration {
        self.ignition_failsafe
    }

    /// Failsafe armed on retraction start.
    pub fn retraction_failsafe(&self) -> Duration {
        self.retraction_failsafe
    }

    /// Activation buffer after ignition.
    pub fn ignite_cooldown(&self) -> Duration {
        self.ignite_cooldown
    }

    /// Activation buffer after retraction start.
    pub fn retract_cooldown(&self) -> Duration {
        self.retract_cooldown
    }

    /// Activation buffer after power off.
    pub fn power_off_cooldown(&self) -> Duration {
        self.power_off_cooldown
    }

    /// Length of a tap sampling window.
    pub fn tap_window(&self) -> Duration {
        self.tap_window
    }

    /// Whether a tap-free window retracts an extended blade.
    pub fn idle_retract(&self) -> bool {
        self.idle_retract
    }

    /// Motor and LED levels.
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Total time from activation to the tension step.
    pub fn ignition_chain_length(&self) -> Duration {
        self.ignite_delay
            .saturating_add(self.clutch_hold)
            .saturating_add(self.seat_time)
            .saturating_add(self.tighten_time)
    }

    fn delays(&self) -> [(DelayField, Duration); 11] {
        [
            (DelayField::IgniteDelay, self.ignite_delay),
            (DelayField::ClutchHold, self.clutch_hold),
            (DelayField::SeatTime, self.seat_time),
            (DelayField::TightenTime, self.tighten_time),
            (DelayField::SoundOffDelay, self.sound_off_delay),
            (DelayField::IgnitionFailsafe, self.ignition_failsafe),
            (DelayField::RetractionFailsafe, self.retraction_failsafe),
            (DelayField::IgniteCooldown, self.ignite_cooldown),
            (DelayField::RetractCooldown, self.retract_cooldown),
            (DelayField::PowerOffCooldown, self.power_off_cooldown),
            (DelayField::TapWindow, self.tap_window),
        ]
    }

    fn validate(&self) -> Result<(), CalibrationError> {
        for (field, delay) in self.delays() {
            if delay > MAX_DELAY {
                return Err(CalibrationError::DelayTooLong(field));
            }
        }

        if self.tap_window == Duration::ZERO {
            return Err(CalibrationError::ZeroTapWindow);
        }

        if self.ignition_failsafe <= self.ignition_chain_length() {
            return Err(CalibrationError::FailsafeTooShort(
                DelayField::IgnitionFailsafe,
            ));
        }

        if self.retraction_failsafe <= self.sound_off_delay {
            return Err(CalibrationError::FailsafeTooShort(
                DelayField::RetractionFailsafe,
            ));
        }

        Ok(())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Builder for constructing validated calibrations.
#[derive(Debug, Clone)]
pub struct CalibrationBuilder {
    calibration: Calibration,
}

impl CalibrationBuilder {
    /// Creates a builder seeded with [`Calibration::default`].
    pub fn new() -> Self {
        Self::from_preset(Calibration::STANDARD)
    }

    /// Creates a builder seeded with an existing calibration.
    pub fn from_preset(calibration: Calibration) -> Self {
        Self { calibration }
    }

    pub fn ignite_delay(mut self, delay: Duration) -> Self {
        self.calibration.ignite_delay = delay;
        self
    }

    pub fn clutch_hold(mut self, delay: Duration) -> Self {
        self.calibration.clutch_hold = delay;
        self
    }

    pub fn seat_time(mut self, delay: Duration) -> Self {
        self.calibration.seat_time = delay;
        self
    }

    pub fn tighten_time(mut self, delay: Duration) -> Self {
        self.calibration.tighten_time = delay;
        self
    }

    pub fn sound_off_delay(mut self, delay: Duration) -> Self {
        self.calibration.sound_off_delay = delay;
        self
    }

    pub fn ignition_failsafe(mut self, delay: Duration) -> Self {
        self.calibration.ignition_failsafe = delay;
        self
    }

    pub fn retraction_failsafe(mut self, delay: Duration) -> Self {
        self.calibration.retraction_failsafe = delay;
        self
    }

    pub fn ignite_cooldown(mut self, delay: Duration) -> Self {
        self.calibration.ignite_cooldown = delay;
        self
    }

    pub fn retract_cooldown(mut self, delay: Duration) -> Self {
        self.calibration.retract_cooldown = delay;
        self
    }

    pub fn power_off_cooldown(mut self, delay: Duration) -> Self {
        self.calibration.power_off_cooldown = delay;
        self
    }

    pub fn tap_window(mut self, window: Duration) -> Self {
        self.calibration.tap_window = window;
        self
    }

    /// Enables or disables retracting after a tap-free window.
    pub fn idle_retract(mut self, enabled: bool) -> Self {
        self.calibration.idle_retract = enabled;
        self
    }

    pub fn levels(mut self, levels: Levels) -> Self {
        self.calibration.levels = levels;
        self
    }

    /// Builds and validates the calibration.
    ///
    /// # Errors
    /// * `DelayTooLong` - A delay exceeds [`MAX_DELAY`]
    /// * `ZeroTapWindow` - The tap window is zero
    /// * `FailsafeTooShort` - A failsafe would cut off the sequence it guards
    pub fn build(self) -> Result<Calibration, CalibrationError> {
        self.calibration.validate()?;
        Ok(self.calibration)
    }
}

impl Default for CalibrationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for preset in [
            Calibration::default(),
            Calibration::spinning(),
            Calibration::spinning_tap_idle(),
            Calibration::jedi(),
        ] {
            assert_eq!(CalibrationBuilder::from_preset(preset).build(), Ok(preset));
        }
    }

    #[test]
    fn default_chain_ends_at_1050ms() {
        assert_eq!(
            Calibration::default().ignition_chain_length(),
            Duration(1050)
        );
    }

    #[test]
    fn presets_differ_where_the_props_differ() {
        let spinning = Calibration::spinning();
        let jedi = Calibration::jedi();

        assert_eq!(spinning.ignite_delay(), Duration(300));
        assert_eq!(spinning.levels().tighten, Level(2000));
        assert!(spinning.idle_retract());

        assert_eq!(jedi.sound_off_delay(), Duration(4500));
        assert_eq!(jedi.levels().chassis_run, Level::OFF);
        assert!(!jedi.idle_retract());
    }

    #[test]
    fn rejects_delay_beyond_wrap_horizon() {
        let result = Calibration::builder()
            .sound_off_delay(Duration(u32::MAX))
            .build();
        assert_eq!(
            result,
            Err(CalibrationError::DelayTooLong(DelayField::SoundOffDelay))
        );
    }

    #[test]
    fn rejects_zero_tap_window() {
        let result = Calibration::builder().tap_window(Duration::ZERO).build();
        assert_eq!(result, Err(CalibrationError::ZeroTapWindow));
    }

    #[test]
    fn rejects_failsafe_inside_chain() {
        let result = Calibration::builder()
            .ignition_failsafe(Duration(1000))
            .build();
        assert_eq!(
            result,
            Err(CalibrationError::FailsafeTooShort(DelayField::IgnitionFailsafe))
        );

        let result = Calibration::builder()
            .retraction_failsafe(Duration(3000))
            .build();
        assert_eq!(
            result,
            Err(CalibrationError::FailsafeTooShort(DelayField::RetractionFailsafe))
        );
    }
}

//! Actuator channels and the hardware traits the sequencer drives.
//!
//! [`Channel`] is the single list of outputs. Rest states are derived from it by
//! exhaustive match, so setup, activation and deactivation can never disagree
//! about which channels exist.

/// PWM duty on the 0..=65535 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Level(pub u16);

impl Level {
    /// Output off.
    pub const OFF: Level = Level(0);
    /// Full duty.
    pub const MAX: Level = Level(u16::MAX);

    /// Returns true for any non-zero duty.
    #[inline]
    pub const fn is_on(self) -> bool {
        self.0 > 0
    }
}

/// Every output the sequencer commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Blade LED strip (PWM).
    Illumination,
    /// Release clutch (on/off: extended or at rest).
    ReleaseActuator,
    /// Blade retraction motor (PWM).
    RetractionMotor,
    /// Cane rotation motor (on/off).
    RotationMotor,
    /// Chassis spin motor (PWM).
    ChassisSpin,
}

impl Channel {
    /// Number of channels.
    pub const COUNT: usize = 5;

    /// Every channel, in the order they are put to rest.
    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Illumination,
        Channel::ReleaseActuator,
        Channel::RetractionMotor,
        Channel::RotationMotor,
        Channel::ChassisSpin,
    ];

    /// The de-energized command for this channel.
    pub const fn rest(self) -> Command {
        match self {
            Channel::Illumination => Command::Illumination(Level::OFF),
            Channel::ReleaseActuator => Command::ReleaseActuator(false),
            Channel::RetractionMotor => Command::RetractionMotor(Level::OFF),
            Channel::RotationMotor => Command::RotationMotor(false),
            Channel::ChassisSpin => Command::ChassisSpin(Level::OFF),
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// One fire-and-forget actuator write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set blade illumination.
    Illumination(Level),
    /// `true` extends the release clutch, `false` returns it to rest.
    ReleaseActuator(bool),
    /// Set retraction motor power.
    RetractionMotor(Level),
    /// Switch the rotation motor.
    RotationMotor(bool),
    /// Set chassis spin motor power.
    ChassisSpin(Level),
}

impl Command {
    /// The channel this command targets.
    pub const fn channel(&self) -> Channel {
        match self {
            Command::Illumination(_) => Channel::Illumination,
            Command::ReleaseActuator(_) => Channel::ReleaseActuator,
            Command::RetractionMotor(_) => Channel::RetractionMotor,
            Command::RotationMotor(_) => Channel::RotationMotor,
            Command::ChassisSpin(_) => Channel::ChassisSpin,
        }
    }

    /// Returns true if this command leaves its channel de-energized.
    pub fn is_rest(&self) -> bool {
        *self == self.channel().rest()
    }
}

/// Trait for abstracting the prop's actuator hardware.
///
/// Implement this for your board's PWM and GPIO outputs. Writes are assumed to
/// succeed; handle any hardware errors internally.
pub trait Actuators {
    /// Sets the blade LED strip duty.
    fn set_illumination(&mut self, level: Level);

    /// Extends (`true`) or rests (`false`) the release clutch.
    fn set_release_actuator(&mut self, extended: bool);

    /// Sets the retraction motor duty.
    fn set_retraction_motor(&mut self, level: Level);

    /// Switches the cane rotation motor.
    fn set_rotation_motor(&mut self, on: bool);

    /// Sets the chassis spin motor duty.
    fn set_chassis_spin(&mut self, level: Level);

    /// Dispatches a [`Command`] to the matching setter.
    fn apply(&mut self, command: Command) {
        match command {
            Command::Illumination(level) => self.set_illumination(level),
            Command::ReleaseActuator(extended) => self.set_release_actuator(extended),
            Command::RetractionMotor(level) => self.set_retraction_motor(level),
            Command::RotationMotor(on) => self.set_rotation_motor(on),
            Command::ChassisSpin(level) => self.set_chassis_spin(level),
        }
    }
}

/// Why the power-off sound cue was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OffReason {
    /// Retraction finished on schedule.
    Normal,
    /// The host called `deactivate` directly.
    Manual,
    /// The failsafe deadline forced a shutdown.
    Failsafe,
}

/// Trait for the sound-font player's power cues.
pub trait AudioCue {
    /// Plays the ignition sound.
    fn signal_power_on(&mut self);

    /// Plays the retraction sound and stops the hum.
    fn signal_power_off(&mut self, reason: OffReason);
}

/// Last command written to every channel.
///
/// The sequencer never reads hardware back, so this is the authoritative view
/// of what each output was told to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputState {
    commands: [Command; Channel::COUNT],
}

impl OutputState {
    /// Every channel at rest.
    pub const fn at_rest() -> Self {
        let mut commands = [Channel::Illumination.rest(); Channel::COUNT];
        let mut i = 0;
        while i < Channel::COUNT {
            commands[i] = Channel::ALL[i].rest();
            i += 1;
        }
        Self { commands }
    }

    /// The last command sent to `channel`.
    pub fn get(&self, channel: Channel) -> Command {
        self.commands[channel.index()]
    }

    /// Records `command`, returning true if it changes the channel.
    pub(crate) fn record(&mut self, command: Command) -> bool {
        let slot = &mut self.commands[command.channel().index()];
        if *slot == command {
            false
        } else {
            *slot = command;
            true
        }
    }

    /// Returns true if every channel is at rest.
    pub fn is_at_rest(&self) -> bool {
        self.commands.iter().all(Command::is_rest)
    }

    /// Current illumination duty.
    pub fn illumination(&self) -> Level {
        match self.get(Channel::Illumination) {
            Command::Illumination(level) => level,
            _ => Level::OFF,
        }
    }

    /// Whether the release clutch is extended.
    pub fn release_extended(&self) -> bool {
        matches!(self.get(Channel::ReleaseActuator), Command::ReleaseActuator(true))
    }

    /// Current retraction motor duty.
    pub fn retraction_motor(&self) -> Level {
        match self.get(Channel::RetractionMotor) {
            Command::RetractionMotor(level) => level,
            _ => Level::OFF,
        }
    }

    /// Whether the rotation motor is on.
    pub fn rotation_motor(&self) -> bool {
        matches!(self.get(Channel::RotationMotor), Command::RotationMotor(true))
    }

    /// Current chassis spin duty.
    pub fn chassis_spin(&self) -> Level {
        match self.get(Channel::ChassisSpin) {
            Command::ChassisSpin(level) => level,
            _ => Level::OFF,
        }
    }
}

impl Default for OutputState {
    fn default() -> Self {
        Self::at_rest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_commands_target_their_channel() {
        for channel in Channel::ALL {
            assert_eq!(channel.rest().channel(), channel);
            assert!(channel.rest().is_rest());
        }
    }

    #[test]
    fn record_reports_changes_only() {
        let mut outputs = OutputState::at_rest();
        assert!(outputs.is_at_rest());

        assert!(!outputs.record(Command::RotationMotor(false)));
        assert!(outputs.record(Command::RetractionMotor(Level(3000))));
        assert!(!outputs.record(Command::RetractionMotor(Level(3000))));

        assert_eq!(outputs.retraction_motor(), Level(3000));
        assert!(!outputs.is_at_rest());
    }
}

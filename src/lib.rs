#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`PropSequencer`**: Owns the deadline slots, power state, activation buffer and tap counter
//! - **`SlotTable`** / **`Deadline`**: One-shot deadlines compared safely across clock wraparound
//! - **`PowerState`**: `Off`, `On` or `Retracting`
//! - **`Guards`**: Named predicates for automatic transitions (`EventDriven`, `ChainCompletion`, `TapIdle`, `SpinGuards`)
//! - **`Keymap`**: Maps `(button, kind, mode)` events to `Stimulus` values
//! - **`Calibration`**: Validated delays and motor levels, with presets for both prop variants
//! - **`Actuators`** / **`AudioCue`**: Traits to implement for your board and sound player
//! - **`TimeSource`**: Trait to implement for your millisecond clock
//! - **`SharedSequencer`**: Critical-section wrapper for interrupt-driven hosts
//!
//! The sequencer never blocks. Call `poll()` every tick and `handle_event()` for
//! every debounced button event, from the same execution context.

pub mod actuator;
pub mod config;
pub mod event;
pub mod machine;
pub mod sequencer;
pub mod shared;
pub mod slot;
pub mod tap;
pub mod time;

pub use actuator::{Actuators, AudioCue, Channel, Command, Level, OffReason, OutputState};
pub use config::{Calibration, CalibrationBuilder, CalibrationError, DelayField, Levels};
pub use event::{
    Binding, Button, ButtonEvent, ButtonMode, EventKind, EventOutcome, KEYMAP_CAPACITY, Keymap,
    KeymapError, Stimulus,
};
pub use machine::{
    ChainCompletion, EventDriven, GuardContext, Guards, PowerState, RotationSensor, SpinGuards,
    TapIdle, Transition, TransitionCause,
};
pub use sequencer::{MAX_TRANSITIONS_PER_POLL, PollReport, PropSequencer, Transitions};
pub use shared::SharedSequencer;
pub use slot::{Deadline, FiredSlots, SLOT_COUNT, SlotKind, SlotTable};
pub use tap::TapCounter;
pub use time::{Duration, MAX_DELAY, TimeSource, Timestamp};

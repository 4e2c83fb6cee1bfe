//! Button event translation.
//!
//! The host's debounce layer reports discrete `(button, kind, mode)` events. A
//! [`Keymap`] maps each recognized triple to exactly one [`Stimulus`]; anything
//! not bound is reported back as unhandled so the host can apply its own
//! default.

use heapless::Vec;

/// Maximum number of bindings in a [`Keymap`].
pub const KEYMAP_CAPACITY: usize = 8;

/// Physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Power,
    Aux,
}

/// Debounced gesture reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    ClickShort,
    ClickLong,
    DoubleClick,
    Pressed,
    Released,
    Held,
}

/// Modifier mode the host was in when the event was decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonMode {
    On,
    Off,
}

/// A discrete button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    pub button: Button,
    pub kind: EventKind,
    pub mode: ButtonMode,
}

impl ButtonEvent {
    /// Creates an event.
    pub const fn new(button: Button, kind: EventKind, mode: ButtonMode) -> Self {
        Self { button, kind, mode }
    }
}

/// Internal stimulus the sequencer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stimulus {
    /// Start the ignition chain.
    IgniteRequest,
    /// Start the retraction chain.
    RetractRequest,
    /// Count a short press in the current tap window.
    Tap,
}

/// What the sequencer did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventOutcome {
    /// Recognized and acted on.
    Handled(Stimulus),
    /// Recognized but gated by the activation buffer or the current state.
    Ignored(Stimulus),
    /// No binding for this event.
    Unhandled,
}

impl EventOutcome {
    /// Returns true unless the event was unbound.
    pub fn is_handled(&self) -> bool {
        !matches!(self, EventOutcome::Unhandled)
    }

    /// The stimulus the event mapped to, if any.
    pub fn stimulus(&self) -> Option<Stimulus> {
        match self {
            EventOutcome::Handled(stimulus) | EventOutcome::Ignored(stimulus) => Some(*stimulus),
            EventOutcome::Unhandled => None,
        }
    }
}

/// One event-to-stimulus mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Binding {
    pub trigger: ButtonEvent,
    pub stimulus: Stimulus,
}

/// Errors that can occur while editing a keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeymapError {
    /// The trigger is already bound.
    DuplicateTrigger(ButtonEvent),

    /// The keymap is full and cannot accept more bindings.
    KeymapFull,
}

impl core::fmt::Display for KeymapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeymapError::DuplicateTrigger(event) => {
                write!(
                    f,
                    "{:?} {:?} in mode {:?} is already bound",
                    event.button, event.kind, event.mode
                )
            }
            KeymapError::KeymapFull => {
                write!(f, "keymap is full, cannot add more bindings")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KeymapError {}

const STANDARD_BINDINGS: [Binding; 6] = [
    Binding {
        trigger: ButtonEvent::new(Button::Power, EventKind::ClickLong, ButtonMode::On),
        stimulus: Stimulus::IgniteRequest,
    },
    Binding {
        trigger: ButtonEvent::new(Button::Power, EventKind::ClickLong, ButtonMode::Off),
        stimulus: Stimulus::IgniteRequest,
    },
    Binding {
        trigger: ButtonEvent::new(Button::Power, EventKind::DoubleClick, ButtonMode::On),
        stimulus: Stimulus::RetractRequest,
    },
    Binding {
        trigger: ButtonEvent::new(Button::Power, EventKind::DoubleClick, ButtonMode::Off),
        stimulus: Stimulus::RetractRequest,
    },
    Binding {
        trigger: ButtonEvent::new(Button::Power, EventKind::ClickShort, ButtonMode::On),
        stimulus: Stimulus::Tap,
    },
    Binding {
        trigger: ButtonEvent::new(Button::Power, EventKind::ClickShort, ButtonMode::Off),
        stimulus: Stimulus::Tap,
    },
];

/// Fixed-capacity table of event bindings.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<Binding, KEYMAP_CAPACITY>,
}

impl Keymap {
    /// Creates an empty keymap.
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Power button bindings: long click ignites, double click retracts, short
    /// click taps. Each is accepted with the host in either mode.
    pub fn standard() -> Self {
        let mut keymap = Self::new();
        for binding in STANDARD_BINDINGS {
            // STANDARD_BINDINGS fits within KEYMAP_CAPACITY.
            let _ = keymap.bindings.push(binding);
        }
        keymap
    }

    /// Binds `trigger` to `stimulus`.
    ///
    /// # Errors
    /// * `DuplicateTrigger` - The trigger is already bound
    /// * `KeymapFull` - No room for another binding
    pub fn bind(&mut self, trigger: ButtonEvent, stimulus: Stimulus) -> Result<(), KeymapError> {
        if self.translate(&trigger).is_some() {
            return Err(KeymapError::DuplicateTrigger(trigger));
        }

        self.bindings
            .push(Binding { trigger, stimulus })
            .map_err(|_| KeymapError::KeymapFull)
    }

    /// Removes the binding for `trigger`, returning its stimulus.
    pub fn unbind(&mut self, trigger: &ButtonEvent) -> Option<Stimulus> {
        let idx = self
            .bindings
            .iter()
            .position(|binding| binding.trigger == *trigger)?;
        Some(self.bindings.swap_remove(idx).stimulus)
    }

    /// Looks up the stimulus bound to `event`.
    pub fn translate(&self, event: &ButtonEvent) -> Option<Stimulus> {
        self.bindings
            .iter()
            .find(|binding| binding.trigger == *event)
            .map(|binding| binding.stimulus)
    }

    /// Returns the current bindings.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power(kind: EventKind, mode: ButtonMode) -> ButtonEvent {
        ButtonEvent::new(Button::Power, kind, mode)
    }

    #[test]
    fn standard_accepts_both_modes() {
        let keymap = Keymap::standard();
        for mode in [ButtonMode::On, ButtonMode::Off] {
            assert_eq!(
                keymap.translate(&power(EventKind::ClickLong, mode)),
                Some(Stimulus::IgniteRequest)
            );
            assert_eq!(
                keymap.translate(&power(EventKind::DoubleClick, mode)),
                Some(Stimulus::RetractRequest)
            );
            assert_eq!(
                keymap.translate(&power(EventKind::ClickShort, mode)),
                Some(Stimulus::Tap)
            );
        }
    }

    #[test]
    fn unbound_events_translate_to_none() {
        let keymap = Keymap::standard();
        assert_eq!(keymap.translate(&power(EventKind::Held, ButtonMode::On)), None);
        assert_eq!(
            keymap.translate(&ButtonEvent::new(
                Button::Aux,
                EventKind::ClickLong,
                ButtonMode::Off
            )),
            None
        );
    }

    #[test]
    fn rejects_duplicate_trigger() {
        let mut keymap = Keymap::standard();
        let trigger = power(EventKind::ClickShort, ButtonMode::On);
        assert_eq!(
            keymap.bind(trigger, Stimulus::RetractRequest),
            Err(KeymapError::DuplicateTrigger(trigger))
        );
        assert_eq!(keymap.translate(&trigger), Some(Stimulus::Tap));
    }

    #[test]
    fn rejects_binding_when_full() {
        let mut keymap = Keymap::standard();
        keymap
            .bind(
                ButtonEvent::new(Button::Aux, EventKind::ClickLong, ButtonMode::On),
                Stimulus::IgniteRequest,
            )
            .unwrap();
        keymap
            .bind(
                ButtonEvent::new(Button::Aux, EventKind::ClickLong, ButtonMode::Off),
                Stimulus::IgniteRequest,
            )
            .unwrap();
        assert_eq!(keymap.len(), KEYMAP_CAPACITY);

        let result = keymap.bind(
            ButtonEvent::new(Button::Aux, EventKind::DoubleClick, ButtonMode::On),
            Stimulus::RetractRequest,
        );
        assert_eq!(result, Err(KeymapError::KeymapFull));
    }

    #[test]
    fn unbind_frees_the_trigger() {
        let mut keymap = Keymap::standard();
        let trigger = power(EventKind::DoubleClick, ButtonMode::Off);

        assert_eq!(keymap.unbind(&trigger), Some(Stimulus::RetractRequest));
        assert_eq!(keymap.translate(&trigger), None);
        assert_eq!(keymap.unbind(&trigger), None);

        keymap.bind(trigger, Stimulus::Tap).unwrap();
        assert_eq!(keymap.translate(&trigger), Some(Stimulus::Tap));
    }

    #[test]
    fn outcome_helpers() {
        assert!(EventOutcome::Handled(Stimulus::Tap).is_handled());
        assert!(EventOutcome::Ignored(Stimulus::IgniteRequest).is_handled());
        assert!(!EventOutcome::Unhandled.is_handled());
        assert_eq!(
            EventOutcome::Ignored(Stimulus::RetractRequest).stimulus(),
            Some(Stimulus::RetractRequest)
        );
        assert_eq!(EventOutcome::Unhandled.stimulus(), None);
    }
}

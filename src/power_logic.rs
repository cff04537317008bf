//! Power-button classification and the sleep-entry sequence.
//!
//! A press/release cycle of the power button is classified on release:
//!
//! | Hold (poll ticks)       | Peer subscribed | Action          |
//! |-------------------------|-----------------|-----------------|
//! | > `PAIR_HOLD_THRESHOLD` | no              | enter pairing   |
//! | > `PAIR_HOLD_THRESHOLD` | yes             | sleep           |
//! | ≤ `PAIR_HOLD_THRESHOLD` | any             | sleep           |
//!
//! A central that is connected but has not enabled notifications does
//! not block pairing.
//!
//! Sleep is System OFF on the nRF52840: the chip only comes back through
//! a cold reset from a pin-sense wake, so [`shutdown`] never returns.

use crate::config::{CHORD_KEY_PINS, POWER_BUTTON_PIN};
use crate::keys::Chord;

/// Where the power button is in its press/release cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Released,
    /// Held, not yet past the hold threshold.
    PressedShort,
    /// Held past the hold threshold.
    PressedLong,
}

/// Outcome of a completed press/release cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerAction {
    EnterPairing,
    Sleep,
}

/// Long-press state machine driven by the debounced power-button level.
pub struct PowerButton {
    state: ButtonState,
    /// Consecutive poll ticks the button has been debounced-pressed.
    hold_ticks: u16,
    threshold: u16,
}

impl PowerButton {
    pub const fn new(threshold: u16) -> Self {
        Self {
            state: ButtonState::Released,
            hold_ticks: 0,
            threshold,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn hold_ticks(&self) -> u16 {
        self.hold_ticks
    }

    /// Feed this tick's debounced level. Returns an action on release.
    pub fn update(&mut self, pressed: bool, subscribed: bool) -> Option<PowerAction> {
        match (self.state, pressed) {
            (ButtonState::Released, false) => None,
            (ButtonState::Released, true) => {
                self.hold_ticks = 0;
                self.count_held_tick();
                None
            }
            (_, true) => {
                self.count_held_tick();
                None
            }
            (held, false) => {
                self.state = ButtonState::Released;
                if held == ButtonState::PressedLong && !subscribed {
                    Some(PowerAction::EnterPairing)
                } else {
                    Some(PowerAction::Sleep)
                }
            }
        }
    }

    fn count_held_tick(&mut self) {
        self.hold_ticks = self.hold_ticks.saturating_add(1);
        self.state = if self.hold_ticks > self.threshold {
            ButtonState::PressedLong
        } else {
            ButtonState::PressedShort
        };
    }
}

// Sleep entry

/// Why the device is going to sleep (for logs).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepReason {
    PowerButton,
    Inactivity,
    AdvertisingTimeout,
}

/// Inputs armed to wake the chip from System OFF on a low level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeSources {
    pub chord_keys: Chord,
    pub power_button: bool,
}

impl WakeSources {
    /// Every chord key and the power button.
    pub const ALL: Self = Self {
        chord_keys: Chord::ALL,
        power_button: true,
    };

    /// GPIO pin numbers to arm.
    pub fn pins(self) -> impl Iterator<Item = u8> {
        let key_pins: &'static [u8] = &CHORD_KEY_PINS;
        key_pins
            .iter()
            .enumerate()
            .filter(move |&(key, _)| self.chord_keys.contains(key))
            .map(|(_, &pin)| pin)
            .chain(self.power_button.then_some(POWER_BUTTON_PIN))
    }
}

/// A sleep the device context has committed to. By the time one is
/// handed out the indicator is already off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SleepRequest {
    pub reason: SleepReason,
    pub wake: WakeSources,
}

/// Wake arming and the irreversible power-off call.
pub trait PowerControl {
    /// Configure `pin` as a pulled-up input that wakes the chip when low.
    fn arm_wake_on_low(&mut self, pin: u8);

    /// Enter System OFF. Does not return.
    fn power_off(&mut self) -> !;
}

/// Arm every wake source of `request`, then power off.
pub fn shutdown<P: PowerControl>(request: SleepRequest, power: &mut P) -> ! {
    info!("Power: system off ({})", request.reason);
    for pin in request.wake.pins() {
        power.arm_wake_on_low(pin);
    }
    power.power_off()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PAIR_HOLD_THRESHOLD_TICKS;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    /// Hold the button for `ticks` debounced ticks, then release.
    fn press(button: &mut PowerButton, ticks: u16, subscribed: bool) -> Option<PowerAction> {
        for _ in 0..ticks {
            assert_eq!(button.update(true, subscribed), None);
        }
        button.update(false, subscribed)
    }

    #[test]
    fn long_hold_without_subscriber_enters_pairing() {
        let mut button = PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS);
        assert_eq!(press(&mut button, 41, false), Some(PowerAction::EnterPairing));
        assert_eq!(button.state(), ButtonState::Released);
    }

    #[test]
    fn long_hold_with_subscriber_sleeps() {
        let mut button = PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS);
        assert_eq!(press(&mut button, 41, true), Some(PowerAction::Sleep));
    }

    #[test]
    fn short_press_sleeps_regardless_of_subscriber() {
        let mut button = PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS);
        assert_eq!(press(&mut button, 10, false), Some(PowerAction::Sleep));
        assert_eq!(press(&mut button, 10, true), Some(PowerAction::Sleep));
    }

    #[test]
    fn hold_exactly_at_threshold_is_still_short() {
        let mut button = PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS);
        assert_eq!(press(&mut button, 40, false), Some(PowerAction::Sleep));
    }

    #[test]
    fn state_escalates_once_threshold_is_exceeded() {
        let mut button = PowerButton::new(3);
        button.update(true, false);
        assert_eq!(button.state(), ButtonState::PressedShort);
        assert_eq!(button.hold_ticks(), 1);

        button.update(true, false);
        button.update(true, false);
        assert_eq!(button.state(), ButtonState::PressedShort);

        button.update(true, false);
        assert_eq!(button.state(), ButtonState::PressedLong);
        assert_eq!(button.hold_ticks(), 4);
    }

    #[test]
    fn hold_counter_restarts_on_each_press() {
        let mut button = PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS);
        press(&mut button, 30, false);
        // 30 + 30 would pass the threshold if the counter carried over.
        assert_eq!(press(&mut button, 30, false), Some(PowerAction::Sleep));
    }

    #[test]
    fn released_button_does_nothing() {
        let mut button = PowerButton::new(PAIR_HOLD_THRESHOLD_TICKS);
        for _ in 0..100 {
            assert_eq!(button.update(false, false), None);
        }
    }

    #[test]
    fn all_wake_sources_cover_every_input_pin() {
        let pins: Vec<u8> = WakeSources::ALL.pins().collect();
        assert_eq!(pins, [4, 5, 30, 28, 2, 6, 3]);
    }

    #[test]
    fn partial_wake_sources() {
        let wake = WakeSources {
            chord_keys: Chord::from_bits(0b10),
            power_button: false,
        };
        assert_eq!(wake.pins().collect::<Vec<_>>(), [5]);

        let power_only = WakeSources {
            chord_keys: Chord::EMPTY,
            power_button: true,
        };
        assert_eq!(power_only.pins().collect::<Vec<_>>(), [POWER_BUTTON_PIN]);
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        Arm(u8),
        PowerOff,
    }

    #[derive(Default)]
    struct RecordingPower {
        calls: Vec<Call>,
    }

    impl PowerControl for RecordingPower {
        fn arm_wake_on_low(&mut self, pin: u8) {
            self.calls.push(Call::Arm(pin));
        }

        fn power_off(&mut self) -> ! {
            self.calls.push(Call::PowerOff);
            panic!("powered off");
        }
    }

    #[test]
    fn shutdown_arms_wake_before_powering_off() {
        let mut power = RecordingPower::default();
        let request = SleepRequest {
            reason: SleepReason::PowerButton,
            wake: WakeSources::ALL,
        };

        let result = catch_unwind(AssertUnwindSafe(|| shutdown(request, &mut power)));
        assert!(result.is_err());

        let (last, armed) = power.calls.split_last().unwrap();
        assert_eq!(*last, Call::PowerOff);
        assert_eq!(armed.len(), 7);
        assert!(armed.iter().all(|c| matches!(c, Call::Arm(_))));
    }
}

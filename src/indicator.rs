//! Status LED patterns.
//!
//! The pattern is a pure function of the device mode. The controller
//! only remembers which mode is showing so that re-entering the same mode
//! does not restart the blink clock.

use crate::config::{LED_BLINK_ADVERTISING_MS, LED_BLINK_PAIRING_MS};

/// What the device is doing, as far as the user can see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Advertising,
    Pairing,
    Connected,
    Sleeping,
}

/// How the LED should behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    /// Toggle every `period_ms`.
    Blink { period_ms: u64 },
    On,
    Off,
}

impl Mode {
    pub const fn pattern(self) -> Pattern {
        match self {
            Mode::Advertising => Pattern::Blink {
                period_ms: LED_BLINK_ADVERTISING_MS,
            },
            Mode::Pairing => Pattern::Blink {
                period_ms: LED_BLINK_PAIRING_MS,
            },
            Mode::Connected => Pattern::On,
            Mode::Sleeping => Pattern::Off,
        }
    }
}

/// The LED driver.
pub trait Indicator {
    /// Stop any running blink, then start `pattern`.
    fn apply(&mut self, pattern: Pattern);

    /// Flip the LED; called on every blink clock tick.
    fn toggle(&mut self);
}

#[derive(Debug, Default)]
pub struct IndicatorController {
    mode: Option<Mode>,
}

impl IndicatorController {
    pub const fn new() -> Self {
        Self { mode: None }
    }

    /// Mode currently shown, `None` before the first [`Self::set_mode`].
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Show `mode`. Returns `false` (and leaves the LED alone) if it was
    /// already showing.
    pub fn set_mode<I: Indicator>(&mut self, mode: Mode, led: &mut I) -> bool {
        if self.mode == Some(mode) {
            return false;
        }

        debug!("Indicator: {} -> {}", self.mode, mode);
        self.mode = Some(mode);
        led.apply(mode.pattern());
        true
    }

    /// Blink clock tick.
    pub fn blink<I: Indicator>(&self, led: &mut I) {
        if let Some(Pattern::Blink { .. }) = self.mode.map(Mode::pattern) {
            led.toggle();
        }
    }
}

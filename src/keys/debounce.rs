//! Two-sample debounce for the chord group and the power button.
//!
//! A raw value is accepted only when it has been read identically on two
//! consecutive ticks and differs from the value currently accepted. A
//! one-tick glitch therefore never reaches the state machines.

use super::{Chord, RawSample};

/// Debounce filter for a single signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Filter<T> {
    /// Raw value seen on the previous tick.
    previous: T,
    /// Last accepted value.
    stable: T,
}

impl<T: Copy + PartialEq> Filter<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            previous: initial,
            stable: initial,
        }
    }

    /// The accepted value.
    pub fn stable(&self) -> T {
        self.stable
    }

    /// Feed this tick's raw value. Returns the new accepted value when
    /// it changed.
    pub fn update(&mut self, raw: T) -> Option<T> {
        let accept = raw == self.previous && raw != self.stable;
        self.previous = raw;

        if accept {
            self.stable = raw;
            Some(raw)
        } else {
            None
        }
    }
}

/// Settled state of every input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebouncedState {
    pub chord: Chord,
    pub power: bool,
}

/// Debounces the chord group and the power button independently.
pub struct Debouncer {
    chord: Filter<Chord>,
    power: Filter<bool>,
}

impl Debouncer {
    /// Both signals start released.
    pub const fn new() -> Self {
        Self {
            chord: Filter::new(Chord::EMPTY),
            power: Filter::new(false),
        }
    }

    /// Feed one raw sample. Returns `true` if either debounced value changed.
    pub fn update(&mut self, sample: RawSample) -> bool {
        let chord_changed = self.chord.update(sample.chord).is_some();
        let power_changed = self.power.update(sample.power).is_some();
        chord_changed || power_changed
    }

    pub fn state(&self) -> DebouncedState {
        DebouncedState {
            chord: self.chord.stable(),
            power: self.power.stable(),
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

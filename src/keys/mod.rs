//! Key input path - sampling, debouncing and chord accumulation.
//!
//! Every poll tick runs the same pipeline:
//!
//! ```text
//! pins ──Sampler──▶ RawSample ──Debouncer──▶ DebouncedState ──ChordAccumulator──▶ Chord
//! ```
//!
//! The power button is sampled and debounced alongside the chord keys but
//! is interpreted by [`crate::power_logic::PowerButton`].

pub mod chord;
pub mod debounce;
pub mod sampler;

pub use chord::ChordAccumulator;
pub use debounce::{DebouncedState, Debouncer};
pub use sampler::Sampler;

use crate::config::CHORD_KEY_COUNT;

const _: () = assert!(CHORD_KEY_COUNT <= 8, "a chord must fit in one byte");

/// Bits that map to a physical chord key.
const CHORD_MASK: u8 = ((1u16 << CHORD_KEY_COUNT) - 1) as u8;

/// Bitmask over the chord group; bit `i` is chord key `i`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chord(u8);

impl Chord {
    /// No keys.
    pub const EMPTY: Self = Self(0);

    /// Every key in the chord group.
    pub const ALL: Self = Self(CHORD_MASK);

    /// Build a chord from raw bits. Bits beyond the chord group are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & CHORD_MASK)
    }

    /// Raw bitmask, as sent over the air.
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if chord key `key` is part of this chord.
    pub const fn contains(self, key: usize) -> bool {
        key < CHORD_KEY_COUNT && self.0 & (1 << key) != 0
    }

    /// Bitwise union of two chords.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// One tick's worth of raw input, already converted to "pressed = true".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// Chord keys currently reading low.
    pub chord: Chord,
    /// Power button currently reading low.
    pub power: bool,
}

impl RawSample {
    pub const fn new(chord: Chord, power: bool) -> Self {
        Self { chord, power }
    }
}

//! Chord accumulation across poll ticks.
//!
//! While any key is held the accumulator absorbs the debounced chord by
//! union, so keys that were pressed and released again before the final
//! release still count. The finished chord is emitted exactly once, on
//! the tick the debounced chord returns to empty.

use super::Chord;

#[derive(Debug, Default)]
pub struct ChordAccumulator {
    chord: Chord,
}

impl ChordAccumulator {
    pub const fn new() -> Self {
        Self {
            chord: Chord::EMPTY,
        }
    }

    /// Keys gathered since the last release.
    pub fn pending(&self) -> Chord {
        self.chord
    }

    /// Feed this tick's debounced chord. Returns the finished chord on
    /// full release.
    pub fn update(&mut self, debounced: Chord) -> Option<Chord> {
        if !debounced.is_empty() {
            self.chord = self.chord.union(debounced);
            None
        } else if !self.chord.is_empty() {
            Some(core::mem::take(&mut self.chord))
        } else {
            None
        }
    }
}

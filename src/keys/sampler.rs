//! Raw pin sampling.
//!
//! All inputs are active-low with a pull-up: a pressed key reads low.
//! The sampler is written against `embedded-hal` so the binary can hand
//! it `embassy_nrf::gpio::Input`s and the tests can hand it fakes.

use embedded_hal::digital::InputPin;

use super::{Chord, RawSample};
use crate::config::CHORD_KEY_COUNT;

/// Reads every chord key and the power button once per call.
pub struct Sampler<P> {
    keys: [P; CHORD_KEY_COUNT],
    power: P,
}

impl<P: InputPin> Sampler<P> {
    /// `keys[i]` becomes bit `i` of every sampled chord.
    pub fn new(keys: [P; CHORD_KEY_COUNT], power: P) -> Self {
        Self { keys, power }
    }

    /// Take one [`RawSample`]. A pin read error is a driver fault.
    pub fn sample(&mut self) -> Result<RawSample, P::Error> {
        let mut bits = 0u8;
        for (bit, pin) in self.keys.iter_mut().enumerate() {
            if pin.is_low()? {
                bits |= 1 << bit;
            }
        }
        let power = self.power.is_low()?;

        Ok(RawSample::new(Chord::from_bits(bits), power))
    }
}

//! Status LED driver.

use chorded_keys::indicator::{Indicator, Pattern};
use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Ticker};

/// Active-high LED with an optional blink clock.
pub struct StatusLed {
    pin: Output<'static>,
    blink: Option<Ticker>,
}

impl StatusLed {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin, blink: None }
    }

    /// Resolves on the next blink clock tick; never while the LED is
    /// steady.
    pub async fn next_blink(&mut self) {
        match self.blink.as_mut() {
            Some(ticker) => ticker.next().await,
            None => core::future::pending().await,
        }
    }
}

impl Indicator for StatusLed {
    fn apply(&mut self, pattern: Pattern) {
        match pattern {
            Pattern::Blink { period_ms } => {
                self.pin.set_high();
                self.blink = Some(Ticker::every(Duration::from_millis(period_ms)));
            }
            Pattern::On => {
                self.blink = None;
                self.pin.set_high();
            }
            Pattern::Off => {
                self.blink = None;
                self.pin.set_low();
            }
        }
    }

    fn toggle(&mut self) {
        self.pin.toggle();
    }
}

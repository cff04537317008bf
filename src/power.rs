//! System OFF for the nRF52840.
//!
//! System OFF draws ~0.3 µA. RAM is lost and the only way back is a
//! reset, triggered here by the GPIO DETECT signal from a pin sensed low.

use chorded_keys::error::Error;
use chorded_keys::power_logic::PowerControl;
use embassy_nrf::pac;
use embassy_nrf::pac::gpio::vals;
use nrf_softdevice::raw;

pub struct SystemOff;

impl PowerControl for SystemOff {
    fn arm_wake_on_low(&mut self, pin: u8) {
        pac::P0.pin_cnf(pin as usize).write(|w| {
            w.set_dir(vals::Dir::INPUT);
            w.set_input(vals::Input::CONNECT);
            w.set_pull(vals::Pull::PULLUP);
            w.set_sense(vals::Sense::LOW);
        });
    }

    fn power_off(&mut self) -> ! {
        // SAFETY: only fails if the SoftDevice is not enabled; it returns
        // an error code in that case instead of powering off.
        let ret = unsafe { raw::sd_power_system_off() };
        defmt::panic!("Power: {}", Error::PowerOff(ret))
    }
}

//! Chorded BLE keyboard firmware for the nRF52840.
//!
//! Six chord keys and a power button are polled every 10 ms. A finished
//! chord goes out as a one-byte GATT notification; the power button
//! sleeps the device or, held while unconnected, enters pairing mode.
//!
//! Task layout:
//!
//! | Task              | Role                                            |
//! |-------------------|-------------------------------------------------|
//! | `main`            | poll / blink / inactivity clocks, device context|
//! | `softdevice_task` | SoftDevice event pump                           |
//! | `ble_task`        | advertising, GATT server, link events           |

#![no_std]
#![no_main]

mod ble;
mod led;
mod power;

use chorded_keys::config::{INACTIVITY_TICK_MS, POLL_TICK_MS};
use chorded_keys::error::Error;
use chorded_keys::keys::Sampler;
use chorded_keys::power_logic::shutdown;
use chorded_keys::{Event, Flow, Keyboard};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_futures::select::{select4, Either4};
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::interrupt::Priority;
use embassy_time::{Duration, Ticker};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;
use {defmt_rtt as _, nrf_softdevice_s140 as _, panic_probe as _};

use ble::bonder::{bonder, Bonder};
use ble::link::{SoftdeviceLink, LINK_EVENTS};
use ble::server::Server;
use led::StatusLed;
use power::SystemOff;

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(
    sd: &'static Softdevice,
    server: &'static Server,
    bonder: &'static Bonder,
) -> ! {
    ble::peripheral::run(sd, server, bonder).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("chorded-keys starting");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let mut led = StatusLed::new(Output::new(p.P0_07, Level::Low, OutputDrive::Standard));

    let mut sampler = Sampler::new(
        [
            Input::new(p.P0_04, Pull::Up),
            Input::new(p.P0_05, Pull::Up),
            Input::new(p.P0_30, Pull::Up),
            Input::new(p.P0_28, Pull::Up),
            Input::new(p.P0_02, Pull::Up),
            Input::new(p.P0_06, Pull::Up),
        ],
        Input::new(p.P0_03, Pull::Up),
    );

    let sd = Softdevice::enable(&ble::softdevice_config());
    static SERVER: StaticCell<Server> = StaticCell::new();
    let server: &'static Server =
        SERVER.init(unwrap!(Server::new(sd).map_err(|_| Error::GattServer)));
    let sd: &'static Softdevice = sd;
    ble::set_preferred_conn_params(sd);

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(ble_task(sd, server, bonder())));

    let mut link = SoftdeviceLink::new(server);
    let mut keyboard = Keyboard::init();
    keyboard.start(&mut link, &mut led);

    let mut poll = Ticker::every(Duration::from_millis(POLL_TICK_MS));
    let mut idle = Ticker::every(Duration::from_millis(INACTIVITY_TICK_MS));

    loop {
        let event = match select4(
            poll.next(),
            led.next_blink(),
            idle.next(),
            LINK_EVENTS.receive(),
        )
        .await
        {
            Either4::First(()) => match sampler.sample() {
                Ok(sample) => Event::Poll(sample),
                Err(e) => match e {},
            },
            Either4::Second(()) => Event::Blink,
            Either4::Third(()) => Event::Inactivity,
            Either4::Fourth(event) => Event::Link(event),
        };

        if let Flow::Sleep(request) = keyboard.handle(event, &mut link, &mut led) {
            shutdown(request, &mut SystemOff);
        }
    }
}

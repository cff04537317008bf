//! Glue between the BLE task and the device context.
//!
//! The BLE task owns advertising and the GATT server; the main loop owns
//! the [`chorded_keys::Keyboard`]. They meet here:
//!
//! - [`LINK_EVENTS`] carries the connection lifecycle to the main loop.
//! - [`ADVERTISE`] asks the BLE task to (re)start advertising.
//! - [`PAIRING_MODE`] lets the bonder accept centrals it has no bond for.
//! - [`CONNECTION`] holds the live connection so `notify` can stay
//!   synchronous.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use chorded_keys::error::{Error, Result};
use chorded_keys::link::{BleLink, LinkEvent};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::Connection;

use super::server::Server;

pub static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, 4> = Channel::new();

pub static ADVERTISE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub static PAIRING_MODE: AtomicBool = AtomicBool::new(false);

static CONNECTION: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>> =
    Mutex::new(RefCell::new(None));

/// Publish (or clear) the live connection.
pub fn set_connection(conn: Option<Connection>) {
    CONNECTION.lock(|c| *c.borrow_mut() = conn);
}

/// [`BleLink`] backed by the SoftDevice GATT server.
pub struct SoftdeviceLink {
    server: &'static Server,
}

impl SoftdeviceLink {
    pub fn new(server: &'static Server) -> Self {
        Self { server }
    }
}

impl BleLink for SoftdeviceLink {
    fn notify(&mut self, value: u8) -> Result<()> {
        CONNECTION.lock(|c| match c.borrow().as_ref() {
            Some(conn) => self
                .server
                .chord
                .chord_notify(conn, &value)
                .map_err(|_| Error::Notify),
            None => Err(Error::InvalidState),
        })
    }

    fn start_advertising(&mut self) {
        ADVERTISE.signal(());
    }

    fn set_pairing_mode(&mut self, enabled: bool) {
        PAIRING_MODE.store(enabled, Ordering::Relaxed);
    }
}

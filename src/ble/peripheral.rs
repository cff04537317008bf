//! Advertising and connection handling.
//!
//! The task sleeps until the device context asks for advertising, then
//! advertises for at most `BLE_ADV_TIMEOUT`. A new request while
//! advertising restarts the window. A connection runs the GATT server
//! until the central goes away; the device context then decides whether
//! to advertise again.

use chorded_keys::config::{BLE_ADV_INTERVAL, BLE_ADV_TIMEOUT, CHORD_SERVICE_UUID_LE, DEVICE_NAME};
use chorded_keys::error::Error;
use chorded_keys::link::LinkEvent;
use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::peripheral::{self, AdvertiseError};
use nrf_softdevice::ble::{gatt_server, Connection};
use nrf_softdevice::Softdevice;

use super::bonder::Bonder;
use super::link::{set_connection, ADVERTISE, LINK_EVENTS};
use super::server::{ChordServiceEvent, Server, ServerEvent};

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_128(ServiceList::Complete, &[CHORD_SERVICE_UUID_LE])
    .build();

/// Latest CCCD level written by the central; older writes are replaced.
static SUBSCRIPTION: Signal<CriticalSectionRawMutex, bool> = Signal::new();

// The 128-bit UUID leaves no room for the name in the advertising packet.
static SCAN_DATA: LegacyAdvertisementPayload =
    LegacyAdvertisementBuilder::new().full_name(DEVICE_NAME).build();

pub async fn run(sd: &'static Softdevice, server: &'static Server, bonder: &'static Bonder) -> ! {
    loop {
        ADVERTISE.wait().await;

        match advertise(sd, bonder).await {
            Ok(Some(conn)) => serve(&conn, server).await,
            Ok(None) => {
                info!("BLE: advertising timed out");
                LINK_EVENTS.send(LinkEvent::AdvertisingTimedOut).await;
            }
            Err(e) => {
                warn!("BLE: {}", e);
                LINK_EVENTS.send(LinkEvent::AdvertisingTimedOut).await;
            }
        }
    }
}

/// Advertise until a central connects (`Some`) or the window closes
/// (`None`). Restarts the window whenever advertising is requested again.
async fn advertise(
    sd: &Softdevice,
    bonder: &'static Bonder,
) -> Result<Option<Connection>, Error> {
    let config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        timeout: Some(BLE_ADV_TIMEOUT),
        ..Default::default()
    };

    loop {
        info!("BLE: advertising ({} s window)", BLE_ADV_TIMEOUT / 100);
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        match select(
            peripheral::advertise_pairable(sd, adv, &config, bonder),
            ADVERTISE.wait(),
        )
        .await
        {
            Either::First(Ok(conn)) => return Ok(Some(conn)),
            Either::First(Err(AdvertiseError::Timeout)) => return Ok(None),
            Either::First(Err(e)) => {
                warn!("BLE: advertise failed: {}", e);
                return Err(Error::Advertising);
            }
            Either::Second(()) => info!("BLE: advertising window restarted"),
        }
    }
}

async fn serve(conn: &Connection, server: &Server) {
    set_connection(Some(conn.clone()));
    SUBSCRIPTION.reset();
    LINK_EVENTS.send(LinkEvent::Connected).await;

    // The GATT callback cannot await, so it only records the latest CCCD
    // level; the forwarder delivers it with backpressure.
    let gatt = gatt_server::run(conn, server, |event| match event {
        ServerEvent::Chord(ChordServiceEvent::ChordCccdWrite { notifications }) => {
            SUBSCRIPTION.signal(notifications);
        }
    });
    let forward = async {
        loop {
            let event = if SUBSCRIPTION.wait().await {
                LinkEvent::NotificationsEnabled
            } else {
                LinkEvent::NotificationsDisabled
            };
            LINK_EVENTS.send(event).await;
        }
    };

    if let Either::First(reason) = select(gatt, forward).await {
        info!("BLE: disconnected: {}", reason);
    }
    set_connection(None);
    LINK_EVENTS.send(LinkEvent::Disconnected).await;
}

//! Bluetooth Low Energy subsystem.
//!
//! Drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Server** - the vendor chord service with its single notify-only
//!    characteristic.
//! 2. **Peripheral** - advertises, accepts one central, runs the GATT
//!    server and reports the connection lifecycle to the main loop.
//! 3. **Link** - the synchronous [`chorded_keys::link::BleLink`] the
//!    device context talks to.
//! 4. **Bonder** - RAM-only Just Works security handler.
//!
//! Link events reach the main loop through [`link::LINK_EVENTS`].

pub mod bonder;
pub mod link;
pub mod peripheral;
pub mod server;

use core::mem;

use chorded_keys::config::{
    BLE_CONN_INTERVAL_MAX, BLE_CONN_INTERVAL_MIN, BLE_SLAVE_LATENCY, BLE_SUP_TIMEOUT, DEVICE_NAME,
};
use defmt::{info, warn};
use nrf_softdevice::{raw, Softdevice};

/// SoftDevice configuration: one peripheral link, internal RC clock.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            // SAFETY: all-zero is a valid (open) security mode.
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Publish the preferred connection parameters in the GAP PPCP
/// characteristic. Centrals are free to ignore them, so a failure is
/// only logged.
pub fn set_preferred_conn_params(_sd: &Softdevice) {
    let ppcp = raw::ble_gap_conn_params_t {
        min_conn_interval: BLE_CONN_INTERVAL_MIN,
        max_conn_interval: BLE_CONN_INTERVAL_MAX,
        slave_latency: BLE_SLAVE_LATENCY,
        conn_sup_timeout: BLE_SUP_TIMEOUT,
    };

    // SAFETY: the SoftDevice is enabled (witnessed by `_sd`) and copies
    // the struct before returning.
    let ret = unsafe { raw::sd_ble_gap_ppcp_set(&ppcp) };
    if ret == raw::NRF_SUCCESS {
        info!(
            "BLE: PPCP {}-{} x1.25ms, latency {}",
            BLE_CONN_INTERVAL_MIN, BLE_CONN_INTERVAL_MAX, BLE_SLAVE_LATENCY
        );
    } else {
        warn!("BLE: PPCP set failed ({})", ret);
    }
}

//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Timing

/// Button polling period (ms). Every tick samples all inputs once.
pub const POLL_TICK_MS: u64 = 10;

/// Number of consecutive debounced-pressed poll ticks the power button
/// must exceed before a release counts as a long press.
/// 40 ticks × 10 ms ≈ 0.4 s.
pub const PAIR_HOLD_THRESHOLD_TICKS: u16 = 40;

/// Period of the inactivity clock (ms).
pub const INACTIVITY_TICK_MS: u64 = 1000;

/// Inactivity clock ticks without a debounced change before sleeping.
/// 300 × 1 s = 5 min.
pub const INACTIVITY_TIMEOUT_TICKS: u32 = 300;

/// Status LED half-period while advertising (ms).
pub const LED_BLINK_ADVERTISING_MS: u64 = 700;

/// Status LED half-period while in pairing mode (ms).
pub const LED_BLINK_PAIRING_MS: u64 = 100;

// GPIO pin assignments (port 0)
//
// These are raw pin numbers; the matching `embassy_nrf::peripherals::*`
// are picked in `main.rs`.  Adjust for your PCB.
//
//   Chord key 0..5 → P0.04, P0.05, P0.30, P0.28, P0.02, P0.06
//   Power button   → P0.03
//   Status LED     → P0.07

/// Number of keys in the chord group (bits 0..K-1 of a chord).
pub const CHORD_KEY_COUNT: usize = 6;

/// Chord key pins, in bit order.
pub const CHORD_KEY_PINS: [u8; CHORD_KEY_COUNT] = [4, 5, 30, 28, 2, 6];

/// Power / pairing button pin.
pub const POWER_BUTTON_PIN: u8 = 3;

// BLE

/// GAP device name, sent in the scan response.
pub const DEVICE_NAME: &str = "Chorded Keys";

/// Advertising interval (in 0.625 ms units). 300 = 187.5 ms.
pub const BLE_ADV_INTERVAL: u32 = 300;

/// Advertising duration (in 10 ms units). 18000 = 180 s.
pub const BLE_ADV_TIMEOUT: u16 = 18000;

/// Preferred connection interval range (in 1.25 ms units).
/// 80 = 100 ms, 160 = 200 ms.
pub const BLE_CONN_INTERVAL_MIN: u16 = 80;
pub const BLE_CONN_INTERVAL_MAX: u16 = 160;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// Chord service UUID, little-endian as the SoftDevice expects it.
/// `5ed01400-eb89-51a7-694d-6141b6a34e44`
pub const CHORD_SERVICE_UUID_LE: [u8; 16] = [
    0x44, 0x4e, 0xa3, 0xb6, 0x41, 0x61, 0x4d, 0x69, 0xa7, 0x51, 0x89, 0xeb, 0x00, 0x14, 0xd0, 0x5e,
];

/// Maximum number of bonds kept in RAM.
pub const MAX_BONDED_PEERS: usize = 4;

//! Unified error type for chorded-keys.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// A chord was dispatched with no connected, subscribed peer.
    InvalidState,

    /// The SoftDevice refused to queue the notification.
    Notify,

    /// The chord GATT service could not be registered.
    GattServer,

    /// Advertising could not be started.
    Advertising,

    // Power
    /// `sd_power_system_off` returned instead of powering down.
    PowerOff(u32),
}

/// Convenience alias used by the core modules.
pub type Result<T> = core::result::Result<T, Error>;

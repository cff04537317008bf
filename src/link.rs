//! Connection state and chord notification.
//!
//! The BLE stack itself lives outside the core. It reports connection
//! lifecycle as [`LinkEvent`]s and is driven through [`BleLink`].

use crate::error::{Error, Result};
use crate::keys::Chord;

/// Connection lifecycle events posted by the BLE layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Connected,
    Disconnected,
    /// The peer enabled notifications on the chord characteristic.
    NotificationsEnabled,
    NotificationsDisabled,
    /// Advertising ran its full window without a connection.
    AdvertisingTimedOut,
}

/// The BLE peripheral layer as seen from the core.
pub trait BleLink {
    /// Send one chord byte as a notification. Fails if no subscribed
    /// connection exists.
    fn notify(&mut self, value: u8) -> Result<()>;

    /// Start advertising, or restart the advertising window if already
    /// advertising.
    fn start_advertising(&mut self);

    /// Tell the security layer whether new bonds may be accepted.
    fn set_pairing_mode(&mut self, enabled: bool);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    pub connected: bool,
    /// Peer has notifications enabled.
    pub subscribed: bool,
    pub pairing_mode: bool,
}

impl ConnectionState {
    pub const fn new() -> Self {
        Self {
            connected: false,
            subscribed: false,
            pairing_mode: false,
        }
    }

    pub fn can_notify(&self) -> bool {
        self.connected && self.subscribed
    }

    /// Track a lifecycle event. A disconnect also drops the subscription.
    pub fn apply(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Connected => self.connected = true,
            LinkEvent::Disconnected => {
                self.connected = false;
                self.subscribed = false;
            }
            LinkEvent::NotificationsEnabled => self.subscribed = true,
            LinkEvent::NotificationsDisabled => self.subscribed = false,
            LinkEvent::AdvertisingTimedOut => {}
        }
    }
}

/// Forward a finished chord to the peer.
///
/// Without a connected, subscribed peer this fails with
/// [`Error::InvalidState`] and the chord is gone: nothing is queued or
/// retried.
pub fn dispatch<L: BleLink>(state: &ConnectionState, link: &mut L, chord: Chord) -> Result<()> {
    if !state.can_notify() {
        return Err(Error::InvalidState);
    }
    link.notify(chord.bits())
}

/// Whether the security layer may bond with a central. Outside pairing
/// mode only a peer that already holds a bond may (re)bond.
pub fn bonding_allowed(pairing_mode: bool, already_bonded: bool) -> bool {
    pairing_mode || already_bonded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeLink {
        sent: Vec<u8>,
        reject: bool,
    }

    impl BleLink for FakeLink {
        fn notify(&mut self, value: u8) -> Result<()> {
            if self.reject {
                return Err(Error::Notify);
            }
            self.sent.push(value);
            Ok(())
        }

        fn start_advertising(&mut self) {}

        fn set_pairing_mode(&mut self, _enabled: bool) {}
    }

    fn subscribed() -> ConnectionState {
        let mut state = ConnectionState::new();
        state.apply(LinkEvent::Connected);
        state.apply(LinkEvent::NotificationsEnabled);
        state
    }

    #[test]
    fn dispatch_sends_when_subscribed() {
        let mut link = FakeLink::default();
        let chord = Chord::from_bits(0b101);
        assert_eq!(dispatch(&subscribed(), &mut link, chord), Ok(()));
        assert_eq!(link.sent, [0b101]);
    }

    #[test]
    fn dispatch_drops_without_connection() {
        let mut link = FakeLink::default();
        let state = ConnectionState::new();
        assert_eq!(
            dispatch(&state, &mut link, Chord::from_bits(1)),
            Err(Error::InvalidState)
        );
        assert!(link.sent.is_empty());
    }

    #[test]
    fn dispatch_drops_when_connected_but_not_subscribed() {
        let mut link = FakeLink::default();
        let mut state = ConnectionState::new();
        state.apply(LinkEvent::Connected);
        assert_eq!(
            dispatch(&state, &mut link, Chord::from_bits(1)),
            Err(Error::InvalidState)
        );

        state.apply(LinkEvent::NotificationsEnabled);
        state.apply(LinkEvent::NotificationsDisabled);
        assert_eq!(
            dispatch(&state, &mut link, Chord::from_bits(1)),
            Err(Error::InvalidState)
        );
        assert!(link.sent.is_empty());
    }

    #[test]
    fn stack_errors_are_passed_through() {
        let mut link = FakeLink {
            reject: true,
            ..Default::default()
        };
        assert_eq!(
            dispatch(&subscribed(), &mut link, Chord::from_bits(1)),
            Err(Error::Notify)
        );
    }

    #[test]
    fn new_peers_bond_only_in_pairing_mode() {
        assert!(!bonding_allowed(false, false));
        assert!(bonding_allowed(true, false));
    }

    #[test]
    fn bonded_peers_rebond_outside_pairing_mode() {
        assert!(bonding_allowed(false, true));
        assert!(bonding_allowed(true, true));
    }

    #[test]
    fn disconnect_clears_subscription() {
        let mut state = subscribed();
        assert!(state.can_notify());
        state.apply(LinkEvent::Disconnected);
        assert_eq!(state, ConnectionState::new());

        // Reconnecting alone is not enough to notify.
        state.apply(LinkEvent::Connected);
        assert!(!state.can_notify());
    }
}

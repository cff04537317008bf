//! Just Works bonding kept in RAM, gated by pairing mode.
//!
//! A central without a bond is only bonded while the device is in
//! pairing mode; a central that already holds a bond may always renew
//! it. Bonds survive reconnects but not System OFF: waking is a cold
//! reset.

use core::cell::RefCell;
use core::sync::atomic::Ordering;

use chorded_keys::config::MAX_BONDED_PEERS;
use chorded_keys::link::bonding_allowed;
use defmt::{info, warn};
use heapless::Vec;
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode};
use static_cell::StaticCell;

use super::link::PAIRING_MODE;

struct Bond {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
}

pub struct Bonder {
    bonds: RefCell<Vec<Bond, MAX_BONDED_PEERS>>,
}

impl Bonder {
    fn new() -> Self {
        Self {
            bonds: RefCell::new(Vec::new()),
        }
    }

    fn is_bonded(&self, conn: &Connection) -> bool {
        self.bonds
            .borrow()
            .iter()
            .any(|b| b.peer_id.is_match(conn.peer_address()))
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::None
    }

    fn can_bond(&self, conn: &Connection) -> bool {
        let pairing = PAIRING_MODE.load(Ordering::Relaxed);
        let allowed = bonding_allowed(pairing, self.is_bonded(conn));
        if !allowed {
            warn!("BLE: bond refused, not in pairing mode");
        }
        allowed
    }

    fn on_bonded(
        &self,
        _conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        let mut bonds = self.bonds.borrow_mut();

        match bonds.iter_mut().find(|b| b.master_id == master_id) {
            Some(bond) => {
                bond.key = key;
                bond.peer_id = peer_id;
                info!("BLE: bond renewed");
            }
            None => {
                if bonds.is_full() {
                    bonds.remove(0);
                }
                let _ = bonds.push(Bond {
                    master_id,
                    key,
                    peer_id,
                });
                info!("BLE: new bond ({}/{})", bonds.len(), MAX_BONDED_PEERS);
            }
        }
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.bonds
            .borrow()
            .iter()
            .find(|b| b.master_id == master_id)
            .map(|b| b.key)
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("BLE: security mode {}", mode);
    }
}

/// The single bonder instance. Call once.
pub fn bonder() -> &'static Bonder {
    static BONDER: StaticCell<Bonder> = StaticCell::new();
    BONDER.init(Bonder::new())
}

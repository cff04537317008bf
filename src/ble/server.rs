//! GATT server: the vendor chord service.
//!
//! One characteristic carrying the last released chord as a single byte,
//! bit `i` set for chord key `i`. Notify only; the value is never cached
//! for reads.

#[nrf_softdevice::gatt_service(uuid = "5ed01400-eb89-51a7-694d-6141b6a34e44")]
pub struct ChordService {
    #[characteristic(uuid = "5ed01401-eb89-51a7-694d-6141b6a34e44", notify)]
    pub chord: u8,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub chord: ChordService,
}

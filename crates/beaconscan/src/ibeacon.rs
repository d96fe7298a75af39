//! iBeacon field extraction
//!
//! An iBeacon advertisement is 30 bytes: a flags structure, then the Apple
//! manufacturer-specific data header, then the proximity UUID, major, minor
//! and calibrated power. The controller appends its RSSI measurement after
//! the advertisement, so the payload handed to [`IBeaconRecord::extract`] is
//! 31 bytes long.

use crate::decoder::IBEACON_DATA_LEN;
use crate::error::DecodeError;

pub const UUID_OFFSET: usize = 9;
pub const UUID_LEN: usize = 16;
pub const CALIBRATED_POWER_OFFSET: usize = 29;
pub const RSSI_OFFSET: usize = 30;

/// Advertisement data plus the trailing RSSI byte
pub const IBEACON_PAYLOAD_LEN: usize = IBEACON_DATA_LEN + 1;

/// Fields decoded from one iBeacon advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IBeaconRecord {
    pub uuid: [u8; UUID_LEN],
    /// Expected RSSI at one metre, in dBm
    pub calibrated_power: i8,
    /// Measured RSSI, in dBm
    pub rssi: i8,
}

/// Reinterpret a wire byte as a signed dBm value
pub fn signed_dbm(raw: u8) -> i8 {
    raw as i8
}

impl IBeaconRecord {
    /// Read the identifier and signal metrics from an iBeacon payload
    pub fn extract(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < IBEACON_PAYLOAD_LEN {
            return Err(DecodeError::Malformed {
                needed: IBEACON_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }

        let mut uuid = [0u8; UUID_LEN];
        uuid.copy_from_slice(&payload[UUID_OFFSET..UUID_OFFSET + UUID_LEN]);

        Ok(Self {
            uuid,
            calibrated_power: signed_dbm(payload[CALIBRATED_POWER_OFFSET]),
            rssi: signed_dbm(payload[RSSI_OFFSET]),
        })
    }

    /// Proximity UUID as 32 uppercase hex digits
    pub fn uuid_hex(&self) -> String {
        hex::encode_upper(self.uuid)
    }
}

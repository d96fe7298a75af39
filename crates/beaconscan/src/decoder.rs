//! LE advertising report decoding
//!
//! Locates the first advertising report in a raw event frame read off the HCI
//! socket. Only single-report frames carrying a 30-byte advertisement are
//! passed on; those are the frames shaped like an iBeacon.

use crate::error::DecodeError;
use crate::hci::constants::*;
use byteorder::ReadBytesExt;
use std::fmt;
use std::io::Cursor;

/// Offset of the LE meta event body: packet type byte plus event header
pub const META_EVENT_OFFSET: usize = 1 + HCI_EVENT_HDR_SIZE;

/// Offset of the first report, past the subevent code and report count
pub const REPORT_OFFSET: usize = META_EVENT_OFFSET + 2;

/// Event type, address type, address and data length
pub const REPORT_HEADER_SIZE: usize = 9;

/// Advertisement length that marks an iBeacon-shaped report
pub const IBEACON_DATA_LEN: usize = 30;

/// Bluetooth device address, stored little-endian as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..6]);
            Some(Self { bytes })
        } else {
            None
        }
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// A view into the first advertising report of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingReport<'a> {
    pub subevent: u8,
    pub event_type: u8,
    pub address_type: u8,
    pub address: BdAddr,
    pub data_length: u8,
    /// Advertisement data followed by the trailing RSSI byte
    pub payload: &'a [u8],
}

impl<'a> AdvertisingReport<'a> {
    /// Advertisement data without the RSSI byte
    pub fn data(&self) -> &'a [u8] {
        &self.payload[..self.data_length as usize]
    }

    /// Raw RSSI byte following the advertisement data
    pub fn rssi(&self) -> u8 {
        self.payload[self.data_length as usize]
    }
}

/// Packet type, event header and subevent code at the front of a frame
#[derive(Debug, Clone, Copy)]
struct MetaHeader {
    packet_type: u8,
    event_code: u8,
    subevent: u8,
}

impl MetaHeader {
    fn read(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        let packet_type = cursor.read_u8()?;
        let event_code = cursor.read_u8()?;
        let _parameter_length = cursor.read_u8()?;
        let subevent = cursor.read_u8()?;
        Ok(Self {
            packet_type,
            event_code,
            subevent,
        })
    }
}

/// Outcome of decoding one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    Report(AdvertisingReport<'a>),
    /// Anything that is not an iBeacon-shaped advertising report
    NotRelevant,
}

/// Decode the advertising report carried by a frame.
///
/// Frames too short to hold an event header, events other than LE meta
/// events, subevents other than advertising reports, and reports whose data
/// length is not 30 are [`Decoded::NotRelevant`]. A report that declares 30
/// bytes of data but is cut short is [`DecodeError::Malformed`].
pub fn decode(frame: &[u8]) -> Result<Decoded<'_>, DecodeError> {
    let header = match MetaHeader::read(&mut Cursor::new(frame)) {
        Ok(header) => header,
        Err(_) => return Ok(Decoded::NotRelevant),
    };

    let MetaHeader {
        packet_type,
        event_code,
        subevent,
    } = header;

    if packet_type != HCI_EVENT_PKT
        || event_code != EVT_LE_META_EVENT
        || subevent != EVT_LE_ADVERTISING_REPORT
    {
        return Ok(Decoded::NotRelevant);
    }

    let header_end = REPORT_OFFSET + REPORT_HEADER_SIZE;
    if frame.len() < header_end {
        return Err(DecodeError::Malformed {
            needed: header_end,
            actual: frame.len(),
        });
    }

    // Only the first report of a frame is looked at
    if frame[META_EVENT_OFFSET + 1] == 0 {
        return Ok(Decoded::NotRelevant);
    }

    let report = &frame[REPORT_OFFSET..];
    let data_length = report[8];
    if data_length as usize != IBEACON_DATA_LEN {
        return Ok(Decoded::NotRelevant);
    }

    // Data plus the RSSI byte
    let needed = header_end + data_length as usize + 1;
    if frame.len() < needed {
        return Err(DecodeError::Malformed {
            needed,
            actual: frame.len(),
        });
    }

    let address = BdAddr::from_slice(&report[2..8]).ok_or(DecodeError::Malformed {
        needed,
        actual: frame.len(),
    })?;

    Ok(Decoded::Report(AdvertisingReport {
        subevent,
        event_type: report[0],
        address_type: report[1],
        address,
        data_length,
        payload: &frame[header_end..needed],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_frame(data: &[u8], rssi: u8) -> Vec<u8> {
        let mut frame = vec![
            HCI_EVENT_PKT,
            EVT_LE_META_EVENT,
            (2 + REPORT_HEADER_SIZE + data.len() + 1) as u8,
            EVT_LE_ADVERTISING_REPORT,
            1,    // Num_Reports
            0x00, // ADV_IND
            0x01, // Random address
            0x11,
            0x22,
            0x33,
            0x44,
            0x55,
            0x66,
            data.len() as u8,
        ];
        frame.extend_from_slice(data);
        frame.push(rssi);
        frame
    }

    #[test]
    fn test_decode_ibeacon_shaped_report() {
        let data: Vec<u8> = (0..30).collect();
        let frame = report_frame(&data, 0xC3);

        let report = match decode(&frame).unwrap() {
            Decoded::Report(report) => report,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(report.subevent, EVT_LE_ADVERTISING_REPORT);
        assert_eq!(report.event_type, 0x00);
        assert_eq!(report.address_type, 0x01);
        assert_eq!(report.address.to_string(), "66:55:44:33:22:11");
        assert_eq!(report.data_length, 30);
        assert_eq!(report.data(), &data[..]);
        assert_eq!(report.payload.len(), 31);
        assert_eq!(report.rssi(), 0xC3);
    }

    #[test]
    fn test_other_subevents_are_not_relevant() {
        let data = [0u8; 30];
        for subevent in [0x01u8, 0x03, 0x04, 0x0D, 0xFF] {
            let mut frame = report_frame(&data, 0xC3);
            frame[3] = subevent;
            assert_eq!(decode(&frame), Ok(Decoded::NotRelevant));
        }
    }

    #[test]
    fn test_other_lengths_are_not_relevant() {
        for len in [0usize, 3, 29, 31, 200] {
            let data = vec![0xAAu8; len];
            let frame = report_frame(&data, 0xC3);
            assert_eq!(decode(&frame), Ok(Decoded::NotRelevant), "length {}", len);
        }
    }

    #[test]
    fn test_non_meta_events_are_not_relevant() {
        let cmd_complete = [HCI_EVENT_PKT, EVT_CMD_COMPLETE, 4, 0x02, 0x0C, 0x20, 0x00];
        assert_eq!(decode(&cmd_complete), Ok(Decoded::NotRelevant));

        let mut acl = report_frame(&[0u8; 30], 0xC3);
        acl[0] = 0x02;
        assert_eq!(decode(&acl), Ok(Decoded::NotRelevant));
    }

    #[test]
    fn test_short_frames_are_not_relevant() {
        assert_eq!(decode(&[]), Ok(Decoded::NotRelevant));
        assert_eq!(decode(&[HCI_EVENT_PKT]), Ok(Decoded::NotRelevant));
        assert_eq!(
            decode(&[HCI_EVENT_PKT, EVT_LE_META_EVENT, 1]),
            Ok(Decoded::NotRelevant)
        );
    }

    #[test]
    fn test_zero_reports_are_not_relevant() {
        let mut frame = report_frame(&[0u8; 30], 0xC3);
        frame[4] = 0;
        assert_eq!(decode(&frame), Ok(Decoded::NotRelevant));
    }

    #[test]
    fn test_truncated_report_is_malformed() {
        let frame = report_frame(&[0u8; 30], 0xC3);

        // Drop the RSSI byte
        let cut = &frame[..frame.len() - 1];
        assert_eq!(
            decode(cut),
            Err(DecodeError::Malformed {
                needed: 45,
                actual: 44
            })
        );

        // Cut inside the report header
        let cut = &frame[..10];
        assert_eq!(
            decode(cut),
            Err(DecodeError::Malformed {
                needed: 14,
                actual: 10
            })
        );
    }
}

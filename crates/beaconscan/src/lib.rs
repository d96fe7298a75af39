//! beaconscan - iBeacon capture over a raw Bluetooth HCI socket
//!
//! This library reads LE advertising reports from a Linux HCI socket, picks
//! out the iBeacon-shaped ones and writes one text line per beacon sighting.
//! Scanning itself is switched on by the caller; the [`session`] module only
//! consumes the event stream.

pub mod adapter;
pub mod config;
pub mod decoder;
pub mod error;
pub mod hci;
pub mod ibeacon;
pub mod output;
pub mod reader;
pub mod session;
pub mod signal;

#[cfg(test)]
mod test_utils;

// Re-export common types for convenience
pub use config::{ScanParameters, ScannerConfig};
pub use decoder::{decode, AdvertisingReport, BdAddr, Decoded};
pub use error::{ConfigError, DecodeError, FilterError, HciError, ScanError};
pub use hci::{EventChannel, FilterState, HciCommand, HciEvent, HciFilter, HciSocket};
pub use ibeacon::IBeaconRecord;
pub use output::{BeaconWriter, LocalTimestamp};
pub use reader::{read_frame, ReadOutcome};
pub use session::{ScanSession, SessionState, SessionStats};

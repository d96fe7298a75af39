//! Error types for the beaconscan library
//!
//! This module defines the error types used throughout the library.

use thiserror::Error;

/// Errors that can occur when working with HCI sockets
#[derive(Error, Debug)]
pub enum HciError {
    #[error("Failed to open HCI socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind to HCI device: {0}")]
    BindError(std::io::Error),

    #[error("Failed to send HCI command: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive HCI event: {0}")]
    ReceiveError(std::io::Error),

    #[error("Device control request failed on hci{dev_id}: {source}")]
    DeviceControl {
        dev_id: u16,
        source: std::io::Error,
    },

    #[error("Invalid HCI packet format")]
    InvalidPacketFormat,

    #[error("HCI command 0x{opcode:04X} failed with status 0x{status:02X}")]
    CommandFailed { opcode: u16, status: u8 },

    #[error("Timed out waiting for completion of HCI command 0x{0:04X}")]
    CommandTimeout(u16),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Errors reading or writing the kernel-side event filter of a channel
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Could not get socket options: {0}")]
    Read(std::io::Error),

    #[error("Could not set socket options: {0}")]
    Write(std::io::Error),
}

/// A frame that claims to be an advertising report but does not fit its own layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed advertising report: need {needed} bytes, frame has {actual}")]
    Malformed { needed: usize, actual: usize },
}

/// Fatal errors that end a scan session
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Could not receive advertising events: {0}")]
    Read(std::io::Error),

    #[error("Could not write beacon record: {0}")]
    Output(std::io::Error),
}

/// Errors loading scanner configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

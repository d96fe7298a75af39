//! HCI protocol constants
//!
//! This module contains constants used in the Bluetooth HCI protocol and the
//! Linux raw HCI socket interface.

// Socket layer
pub const AF_BLUETOOTH: i32 = 31;
pub const BTPROTO_HCI: i32 = 1;
pub const HCI_CHANNEL_RAW: u16 = 0;
pub const SOL_HCI: i32 = 0;
pub const HCI_FILTER: i32 = 2;

// ioctl requests: _IOW('H', 201, int) and _IOW('H', 202, int)
pub const HCIDEVUP: libc::c_ulong = 0x400448C9;
pub const HCIDEVDOWN: libc::c_ulong = 0x400448CA;

// HCI packet types
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_EVENT_PKT: u8 = 0x04;
pub const HCI_VENDOR_PKT: u8 = 0xFF;

// Filter bit widths
pub const HCI_FLT_TYPE_BITS: u8 = 31;
pub const HCI_FLT_EVENT_BITS: u8 = 63;

// Event header: event code + parameter length
pub const HCI_EVENT_HDR_SIZE: usize = 2;

// Largest event frame: packet type + header + 255 parameter bytes
pub const HCI_MAX_EVENT_SIZE: usize = 260;

// LE Command OCF values (OGF: 0x08)
pub const OGF_LE: u8 = 0x08;
pub const OCF_LE_SET_SCAN_PARAMETERS: u16 = 0x000B;
pub const OCF_LE_SET_SCAN_ENABLE: u16 = 0x000C;

// HCI Events
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
pub const EVT_LE_META_EVENT: u8 = 0x3E;

// LE Meta Events
pub const EVT_LE_ADVERTISING_REPORT: u8 = 0x02;

// LE own address type
pub const LE_PUBLIC_ADDRESS: u8 = 0x00;

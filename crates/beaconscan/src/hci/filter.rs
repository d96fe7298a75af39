//! Kernel-side HCI socket filter
//!
//! A raw HCI socket only delivers the packet types and events enabled in its
//! `HCI_FILTER` socket option. This module models that option and provides the
//! install/restore pair the scan session wraps its loop in.

use crate::error::FilterError;
use crate::hci::constants::*;
use crate::hci::socket::EventChannel;
use byteorder::{ByteOrder, LittleEndian, NativeEndian};

/// Size of `struct hci_filter` as the kernel copies it, trailing padding included
pub const HCI_FILTER_SIZE: usize = 16;

/// Raw value of the `HCI_FILTER` socket option.
///
/// Captured before a session modifies the filter and written back untouched
/// afterwards, whatever the driver put in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterState(pub [u8; HCI_FILTER_SIZE]);

/// Decoded `struct hci_filter`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HciFilter {
    pub type_mask: u32,
    pub event_mask: [u32; 2],
    pub opcode: u16,
}

impl HciFilter {
    /// A filter that lets nothing through
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a packet type through
    pub fn set_ptype(&mut self, ptype: u8) {
        let bit = if ptype == HCI_VENDOR_PKT {
            0
        } else {
            ptype & HCI_FLT_TYPE_BITS
        };
        self.type_mask |= 1 << bit;
    }

    /// Allow an event code through
    pub fn set_event(&mut self, event: u8) {
        let bit = (event & HCI_FLT_EVENT_BITS) as usize;
        self.event_mask[bit >> 5] |= 1 << (bit & 31);
    }

    pub fn set_opcode(&mut self, opcode: u16) {
        self.opcode = opcode;
    }

    /// Filter selecting only LE meta events
    pub fn le_meta_events() -> Self {
        let mut filter = Self::new();
        filter.set_ptype(HCI_EVENT_PKT);
        filter.set_event(EVT_LE_META_EVENT);
        filter
    }

    /// Filter selecting the completion events of one command
    pub fn command_completion(opcode: u16) -> Self {
        let mut filter = Self::new();
        filter.set_ptype(HCI_EVENT_PKT);
        filter.set_event(EVT_CMD_COMPLETE);
        filter.set_event(EVT_CMD_STATUS);
        filter.set_opcode(opcode);
        filter
    }

    /// Encode as the socket option value.
    ///
    /// The masks are host-endian; the opcode is little-endian like every
    /// other opcode on the HCI wire.
    pub fn to_state(&self) -> FilterState {
        let mut bytes = [0u8; HCI_FILTER_SIZE];
        NativeEndian::write_u32(&mut bytes[0..4], self.type_mask);
        NativeEndian::write_u32(&mut bytes[4..8], self.event_mask[0]);
        NativeEndian::write_u32(&mut bytes[8..12], self.event_mask[1]);
        LittleEndian::write_u16(&mut bytes[12..14], self.opcode);
        FilterState(bytes)
    }

    /// Decode a socket option value
    pub fn from_state(state: &FilterState) -> Self {
        let bytes = &state.0;
        Self {
            type_mask: NativeEndian::read_u32(&bytes[0..4]),
            event_mask: [
                NativeEndian::read_u32(&bytes[4..8]),
                NativeEndian::read_u32(&bytes[8..12]),
            ],
            opcode: LittleEndian::read_u16(&bytes[12..14]),
        }
    }
}

/// Install the LE meta event filter on a channel.
///
/// Returns the filter that was in effect before, for [`restore_filter`].
pub fn install_filter<C: EventChannel + ?Sized>(channel: &mut C) -> Result<FilterState, FilterError> {
    let previous = channel.filter()?;
    log::debug!("Previous HCI filter: {:?}", HciFilter::from_state(&previous));
    channel.set_filter(&HciFilter::le_meta_events().to_state())?;
    log::debug!("Installed LE meta event filter");
    Ok(previous)
}

/// Write back a filter captured by [`install_filter`].
///
/// Best effort: a failure is logged and otherwise ignored.
pub fn restore_filter<C: EventChannel + ?Sized>(channel: &mut C, previous: &FilterState) {
    match channel.set_filter(previous) {
        Ok(()) => log::debug!("Restored previous HCI filter"),
        Err(e) => log::warn!("Failed to restore HCI filter: {}", e),
    }
}

//! Bluetooth HCI (Host Controller Interface) implementation
//!
//! This module provides functionality for interacting with HCI interfaces.

pub mod constants;
pub mod filter;
pub mod packet;
pub mod socket;


pub use filter::{install_filter, restore_filter, FilterState, HciFilter};
pub use packet::{HciCommand, HciEvent};
pub use socket::{EventChannel, HciSocket};

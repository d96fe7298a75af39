//! HCI Socket implementation for Bluetooth communication
//!
//! This module provides a wrapper around the raw HCI socket interface,
//! allowing for communication with Bluetooth controllers.

use crate::error::{FilterError, HciError};
use crate::hci::constants::*;
use crate::hci::filter::{FilterState, HCI_FILTER_SIZE};
use crate::hci::packet::{HciCommand, HciEvent};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

/// A byte channel carrying HCI event frames.
///
/// The scan session only ever talks to the controller through this trait.
pub trait EventChannel {
    /// Read one frame into `buf`, returning the number of bytes read
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Current kernel-side filter
    fn filter(&mut self) -> Result<FilterState, FilterError>;

    /// Replace the kernel-side filter
    fn set_filter(&mut self, state: &FilterState) -> Result<(), FilterError>;
}

/// Represents an HCI socket
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

impl HciSocket {
    /// Gets the raw file descriptor for the socket
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    /// Opens a new HCI socket
    ///
    /// # Arguments
    ///
    /// * `dev_id` - The device ID to open (0 for the first device)
    ///
    /// # Returns
    ///
    /// A new `HciSocket` instance or an error if the socket could not be opened
    pub fn open(dev_id: u16) -> Result<Self, HciError> {
        // Open a raw HCI socket
        let fd = unsafe { libc::socket(AF_BLUETOOTH, libc::SOCK_RAW, BTPROTO_HCI) };

        if fd < 0 {
            return Err(HciError::SocketError(io::Error::last_os_error()));
        }

        // Bind to the specified device
        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW,
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(HciError::BindError(err));
        }

        Ok(HciSocket { fd })
    }

    /// Read raw bytes from the socket, one frame per call
    pub fn read_raw(&self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes_read =
            unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };

        if bytes_read < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(bytes_read as usize)
    }

    /// Read the `HCI_FILTER` socket option
    pub fn get_filter(&self) -> Result<FilterState, FilterError> {
        let mut bytes = [0u8; HCI_FILTER_SIZE];
        let mut len = HCI_FILTER_SIZE as libc::socklen_t;

        let result = unsafe {
            libc::getsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                bytes.as_mut_ptr() as *mut libc::c_void,
                &mut len,
            )
        };

        if result < 0 {
            return Err(FilterError::Read(io::Error::last_os_error()));
        }
        Ok(FilterState(bytes))
    }

    /// Write the `HCI_FILTER` socket option
    pub fn put_filter(&self, state: &FilterState) -> Result<(), FilterError> {
        let result = unsafe {
            libc::setsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                state.0.as_ptr() as *const libc::c_void,
                HCI_FILTER_SIZE as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(FilterError::Write(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Read an HCI event from the socket
    pub fn read_event(&self) -> Result<HciEvent, HciError> {
        let mut buffer = [0u8; HCI_MAX_EVENT_SIZE];

        let bytes_read = self.read_raw(&mut buffer).map_err(HciError::ReceiveError)?;

        if bytes_read < 3 || buffer[0] != HCI_EVENT_PKT {
            return Err(HciError::InvalidPacketFormat);
        }

        // Parse event
        match HciEvent::parse(&buffer[1..bytes_read]) {
            Some(event) => Ok(event),
            None => Err(HciError::InvalidPacketFormat),
        }
    }

    /// Read an HCI event from the socket with a timeout
    pub fn read_event_timeout(&self, timeout: Option<Duration>) -> Result<HciEvent, HciError> {
        if let Some(timeout) = timeout {
            // Set up the fd_set for select()
            let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
            unsafe {
                libc::FD_ZERO(&mut read_fds);
                libc::FD_SET(self.fd, &mut read_fds);
            }

            // Set up the timeout
            let mut timeout_val = libc::timeval {
                tv_sec: timeout.as_secs() as libc::time_t,
                tv_usec: timeout.subsec_micros() as libc::suseconds_t,
            };

            // Wait for data to be available
            let result = unsafe {
                libc::select(
                    self.fd + 1,
                    &mut read_fds,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    &mut timeout_val,
                )
            };

            if result < 0 {
                return Err(HciError::ReceiveError(io::Error::last_os_error()));
            }

            if result == 0 {
                return Err(HciError::ReceiveError(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "Timed out waiting for HCI event",
                )));
            }
        }

        // Read the event
        self.read_event()
    }

    /// Sends an HCI command to the controller
    pub fn send_command(&self, command: &HciCommand) -> Result<(), HciError> {
        let packet = command.to_packet();
        match unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        } {
            -1 => Err(HciError::SendError(io::Error::last_os_error())),
            _ => Ok(()),
        }
    }
}

impl EventChannel for HciSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_raw(buf)
    }

    fn filter(&mut self) -> Result<FilterState, FilterError> {
        self.get_filter()
    }

    fn set_filter(&mut self, state: &FilterState) -> Result<(), FilterError> {
        self.put_filter(state)
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

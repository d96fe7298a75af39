//! Adapter bring-up and scan control
//!
//! Resets the adapter through device-control ioctls and switches LE scanning
//! on and off, waiting for the controller to acknowledge each command.

use crate::config::ScanParameters;
use crate::error::HciError;
use crate::hci::constants::*;
use crate::hci::filter::HciFilter;
use crate::hci::packet::{HciCommand, HciEvent};
use crate::hci::socket::HciSocket;
use std::io;
use std::time::{Duration, Instant};

/// Issue one device-control ioctl on a throwaway control socket
fn device_control(dev_id: u16, request: libc::c_ulong) -> io::Result<()> {
    unsafe {
        let fd = libc::socket(AF_BLUETOOTH, libc::SOCK_RAW | libc::SOCK_CLOEXEC, BTPROTO_HCI);
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let ret = libc::ioctl(fd, request as _, dev_id as libc::c_int);
        let err = io::Error::last_os_error();
        libc::close(fd);
        if ret < 0 {
            return Err(err);
        }
    }
    Ok(())
}

/// Bring the device down and back up
pub fn reset(dev_id: u16) -> Result<(), HciError> {
    log::info!("Resetting hci{}", dev_id);

    device_control(dev_id, HCIDEVDOWN).map_err(|source| HciError::DeviceControl { dev_id, source })?;

    match device_control(dev_id, HCIDEVUP) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EALREADY) => Ok(()),
        Err(source) => Err(HciError::DeviceControl { dev_id, source }),
    }
}

/// Send a command and wait for the controller to complete it.
///
/// The socket filter is narrowed to the command's completion events for the
/// duration of the call and put back afterwards.
pub fn send_and_wait(
    socket: &HciSocket,
    command: &HciCommand,
    timeout: Duration,
) -> Result<HciEvent, HciError> {
    let opcode = command.opcode();
    let previous = socket.get_filter()?;
    socket.put_filter(&HciFilter::command_completion(opcode).to_state())?;

    let result = socket
        .send_command(command)
        .and_then(|()| wait_for_completion(socket, command, timeout));

    if let Err(e) = socket.put_filter(&previous) {
        log::warn!("Failed to restore HCI filter after command 0x{:04X}: {}", opcode, e);
    }
    result
}

fn wait_for_completion(
    socket: &HciSocket,
    command: &HciCommand,
    timeout: Duration,
) -> Result<HciEvent, HciError> {
    let opcode = command.opcode();
    let (ogf, ocf) = command.opcode_parts();
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
            .ok_or(HciError::CommandTimeout(opcode))?;

        let event = match socket.read_event_timeout(Some(remaining)) {
            Ok(event) => event,
            Err(HciError::ReceiveError(e)) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(HciError::CommandTimeout(opcode))
            }
            Err(HciError::ReceiveError(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(HciError::InvalidPacketFormat) => continue,
            Err(e) => return Err(e),
        };

        if event.command_opcode() != Some(opcode) {
            continue;
        }

        let status = event.get_status();
        if status != 0 {
            return Err(HciError::CommandFailed { opcode, status });
        }
        if event.is_command_complete(ogf, ocf) {
            return Ok(event);
        }
    }
}

pub fn set_scan_parameters(
    socket: &HciSocket,
    params: &ScanParameters,
    timeout: Duration,
) -> Result<(), HciError> {
    let command = HciCommand::LeSetScanParameters {
        scan_type: params.scan_type,
        scan_interval: params.interval,
        scan_window: params.window,
        own_address_type: params.own_address_type,
        filter_policy: params.filter_policy,
    };
    send_and_wait(socket, &command, timeout)?;
    Ok(())
}

pub fn set_scan_enable(
    socket: &HciSocket,
    enable: bool,
    filter_duplicates: bool,
    timeout: Duration,
) -> Result<(), HciError> {
    let command = HciCommand::LeSetScanEnable {
        enable,
        filter_duplicates,
    };
    send_and_wait(socket, &command, timeout)?;
    Ok(())
}

//! Scripted in-memory channel for driving the reader and session in tests

use crate::error::FilterError;
use crate::hci::constants::*;
use crate::hci::filter::{FilterState, HciFilter};
use crate::hci::socket::EventChannel;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One scripted result of `EventChannel::read`
#[derive(Debug, Clone)]
pub enum Step {
    Frame(Vec<u8>),
    Error(io::ErrorKind),
    /// SIGINT arrives while blocked: raise the flag, then fail with EINTR
    Interrupt,
    /// Deliver a real SIGINT to this thread, then fail with EINTR
    RaiseSigint,
}

pub struct ScriptedChannel {
    steps: VecDeque<Step>,
    shutdown: Arc<AtomicBool>,
    pub current_filter: FilterState,
    pub filter_writes: Vec<FilterState>,
    pub reads: usize,
    pub fail_get_filter: bool,
    pub fail_set_filter_after: Option<usize>,
}

impl ScriptedChannel {
    pub fn new(steps: Vec<Step>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            steps: steps.into(),
            shutdown,
            current_filter: original_filter(),
            filter_writes: Vec::new(),
            reads: 0,
            fail_get_filter: false,
            fail_set_filter_after: None,
        }
    }
}

impl EventChannel for ScriptedChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(Step::Frame(frame)) => {
                buf[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            Some(Step::Error(kind)) => Err(io::Error::from(kind)),
            Some(Step::Interrupt) => {
                self.shutdown.store(true, Ordering::SeqCst);
                Err(io::Error::from(io::ErrorKind::Interrupted))
            }
            Some(Step::RaiseSigint) => {
                if unsafe { libc::raise(libc::SIGINT) } != 0 {
                    return Err(io::Error::last_os_error());
                }
                Err(io::Error::from(io::ErrorKind::Interrupted))
            }
            None => Err(io::Error::new(io::ErrorKind::Other, "script exhausted")),
        }
    }

    fn filter(&mut self) -> Result<FilterState, FilterError> {
        if self.fail_get_filter {
            return Err(FilterError::Read(io::Error::from_raw_os_error(libc::EBADF)));
        }
        Ok(self.current_filter)
    }

    fn set_filter(&mut self, state: &FilterState) -> Result<(), FilterError> {
        if let Some(limit) = self.fail_set_filter_after {
            if self.filter_writes.len() >= limit {
                return Err(FilterError::Write(io::Error::from_raw_os_error(libc::EBADF)));
            }
        }
        self.filter_writes.push(*state);
        self.current_filter = *state;
        Ok(())
    }
}

/// Filter a freshly bound raw socket might carry
pub fn original_filter() -> FilterState {
    let mut filter = HciFilter::new();
    filter.set_ptype(HCI_EVENT_PKT);
    filter.set_event(EVT_CMD_COMPLETE);
    filter.set_event(EVT_CMD_STATUS);
    filter.set_opcode(0x200C);
    filter.to_state()
}

/// A full LE advertising report frame with one report of `data`
pub fn advertising_frame(data: &[u8], rssi: u8) -> Vec<u8> {
    let mut frame = vec![
        HCI_EVENT_PKT,
        EVT_LE_META_EVENT,
        (2 + 9 + data.len() + 1) as u8,
        EVT_LE_ADVERTISING_REPORT,
        1,
        0x00,
        0x00,
        0xAA,
        0xBB,
        0xCC,
        0xDD,
        0xEE,
        0xFF,
        data.len() as u8,
    ];
    frame.extend_from_slice(data);
    frame.push(rssi);
    frame
}

/// A 30-byte iBeacon advertisement carrying `uuid` and `power`
pub fn ibeacon_data(uuid: [u8; 16], power: u8) -> Vec<u8> {
    let mut data = vec![0x02, 0x01, 0x06, 0x1A, 0xFF, 0x4C, 0x00, 0x02, 0x15];
    data.extend_from_slice(&uuid);
    data.extend_from_slice(&[0x00, 0x01, 0x00, 0x02]);
    data.push(power);
    data
}

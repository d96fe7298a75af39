//! Scan session
//!
//! Ties the reader, decoder, extractor and writer together. The LE meta event
//! filter is installed before the first read and the previous filter is
//! written back on every way out of the loop.

use crate::decoder::{decode, Decoded};
use crate::error::ScanError;
use crate::hci::constants::HCI_MAX_EVENT_SIZE;
use crate::hci::filter::{install_filter, restore_filter};
use crate::hci::socket::EventChannel;
use crate::ibeacon::IBeaconRecord;
use crate::output::{BeaconWriter, LocalTimestamp};
use crate::reader::{read_frame, FrameBuffer, ReadOutcome};
use std::io::Write;
use std::sync::atomic::AtomicBool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Done,
}

/// Frame counts for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_read: u64,
    pub beacons: u64,
    pub not_relevant: u64,
    pub malformed: u64,
}

/// A single scan over an already configured channel
pub struct ScanSession<'a, C: EventChannel + ?Sized, W: Write> {
    channel: &'a mut C,
    writer: BeaconWriter<W>,
    shutdown: &'a AtomicBool,
    state: SessionState,
    stats: SessionStats,
}

impl<'a, C: EventChannel + ?Sized, W: Write> ScanSession<'a, C, W> {
    pub fn new(channel: &'a mut C, writer: BeaconWriter<W>, shutdown: &'a AtomicBool) -> Self {
        Self {
            channel,
            writer,
            shutdown,
            state: SessionState::Idle,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn into_writer(self) -> BeaconWriter<W> {
        self.writer
    }

    /// Scan until shutdown is requested or the channel fails.
    ///
    /// Returns the session's frame counts on a clean stop. The filter that was
    /// in effect before the call is back in effect when it returns, unless it
    /// could not be read in the first place.
    pub fn run(&mut self) -> Result<SessionStats, ScanError> {
        let previous = match install_filter(&mut *self.channel) {
            Ok(previous) => previous,
            Err(e) => {
                self.state = SessionState::Done;
                return Err(e.into());
            }
        };

        self.state = SessionState::Running;
        log::info!("Scanning for iBeacon advertisements");
        let result = self.scan();

        self.state = SessionState::Stopping;
        restore_filter(&mut *self.channel, &previous);
        self.state = SessionState::Done;

        log::info!(
            "Scan stopped: {} frames read, {} beacons, {} not relevant, {} malformed",
            self.stats.frames_read,
            self.stats.beacons,
            self.stats.not_relevant,
            self.stats.malformed
        );

        result.map(|()| self.stats)
    }

    fn scan(&mut self) -> Result<(), ScanError> {
        let mut buf: FrameBuffer = [0u8; HCI_MAX_EVENT_SIZE];

        loop {
            let len = match read_frame(&mut *self.channel, &mut buf, self.shutdown)
                .map_err(ScanError::Read)?
            {
                ReadOutcome::Frame(len) => len,
                ReadOutcome::Stop => {
                    log::info!("Shutdown requested");
                    return Ok(());
                }
            };

            let timestamp = LocalTimestamp::now();
            self.stats.frames_read += 1;
            self.handle_frame(&buf[..len], &timestamp)?;
        }
    }

    fn handle_frame(&mut self, frame: &[u8], timestamp: &LocalTimestamp) -> Result<(), ScanError> {
        let report = match decode(frame) {
            Ok(Decoded::Report(report)) => report,
            Ok(Decoded::NotRelevant) => {
                self.stats.not_relevant += 1;
                return Ok(());
            }
            Err(e) => {
                log::debug!("Skipping frame: {}", e);
                self.stats.malformed += 1;
                return Ok(());
            }
        };

        let record = match IBeaconRecord::extract(report.payload) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Skipping report from {}: {}", report.address, e);
                self.stats.malformed += 1;
                return Ok(());
            }
        };

        log::debug!("iBeacon {} from {}", record.uuid_hex(), report.address);
        self.writer
            .write_record(timestamp, &record)
            .map_err(ScanError::Output)?;
        self.stats.beacons += 1;
        Ok(())
    }
}

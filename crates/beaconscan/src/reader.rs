//! Frame reader
//!
//! Pulls one raw event frame at a time off an [`EventChannel`]. "Would block"
//! and "interrupted" are not failures on a live HCI stream: the read is simply
//! retried, unless the shutdown flag has been raised.

use crate::hci::constants::HCI_MAX_EVENT_SIZE;
use crate::hci::socket::EventChannel;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Buffer large enough for any HCI event frame
pub type FrameBuffer = [u8; HCI_MAX_EVENT_SIZE];

/// Result of a successful call to [`read_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A frame of this many bytes is at the front of the buffer
    Frame(usize),
    /// Shutdown was requested
    Stop,
}

/// Read the next frame into `buf`.
///
/// Retries without limit on `WouldBlock` and `Interrupted`. Returns
/// [`ReadOutcome::Stop`] once `shutdown` is set, checked before each read and
/// whenever a read comes back without data. Any other error, or an
/// end-of-stream, is returned to the caller.
pub fn read_frame<C: EventChannel + ?Sized>(
    channel: &mut C,
    buf: &mut [u8],
    shutdown: &AtomicBool,
) -> io::Result<ReadOutcome> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return Ok(ReadOutcome::Stop);
        }

        match channel.read(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "HCI channel closed",
                ))
            }
            Ok(len) => return Ok(ReadOutcome::Frame(len)),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                if shutdown.load(Ordering::SeqCst) {
                    return Ok(ReadOutcome::Stop);
                }
                log::trace!("Retrying read after {}", e);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedChannel, Step};
    use std::sync::Arc;

    fn channel(steps: Vec<Step>) -> (ScriptedChannel, Arc<AtomicBool>) {
        let shutdown = Arc::new(AtomicBool::new(false));
        (ScriptedChannel::new(steps, Arc::clone(&shutdown)), shutdown)
    }

    #[test]
    fn test_returns_frame_length() {
        let (mut chan, shutdown) = channel(vec![Step::Frame(vec![0x04, 0x3E, 0x01, 0x02])]);
        let mut buf: FrameBuffer = [0; HCI_MAX_EVENT_SIZE];

        let outcome = read_frame(&mut chan, &mut buf, &shutdown).unwrap();
        assert_eq!(outcome, ReadOutcome::Frame(4));
        assert_eq!(&buf[..4], &[0x04, 0x3E, 0x01, 0x02]);
    }

    #[test]
    fn test_retries_transient_errors() {
        let (mut chan, shutdown) = channel(vec![
            Step::Error(io::ErrorKind::WouldBlock),
            Step::Error(io::ErrorKind::Interrupted),
            Step::Error(io::ErrorKind::WouldBlock),
            Step::Frame(vec![0x04, 0x0E]),
        ]);
        let mut buf: FrameBuffer = [0; HCI_MAX_EVENT_SIZE];

        let outcome = read_frame(&mut chan, &mut buf, &shutdown).unwrap();
        assert_eq!(outcome, ReadOutcome::Frame(2));
        assert_eq!(chan.reads, 4);
    }

    #[test]
    fn test_interrupt_with_shutdown_stops() {
        let (mut chan, shutdown) = channel(vec![Step::Interrupt, Step::Frame(vec![0x04])]);
        let mut buf: FrameBuffer = [0; HCI_MAX_EVENT_SIZE];

        let outcome = read_frame(&mut chan, &mut buf, &shutdown).unwrap();
        assert_eq!(outcome, ReadOutcome::Stop);
        assert_eq!(chan.reads, 1);
    }

    #[test]
    fn test_flag_already_set_stops_before_reading() {
        let (mut chan, shutdown) = channel(vec![Step::Frame(vec![0x04])]);
        shutdown.store(true, Ordering::SeqCst);
        let mut buf: FrameBuffer = [0; HCI_MAX_EVENT_SIZE];

        let outcome = read_frame(&mut chan, &mut buf, &shutdown).unwrap();
        assert_eq!(outcome, ReadOutcome::Stop);
        assert_eq!(chan.reads, 0);
    }

    #[test]
    fn test_other_errors_are_returned() {
        let (mut chan, shutdown) = channel(vec![Step::Error(io::ErrorKind::NotConnected)]);
        let mut buf: FrameBuffer = [0; HCI_MAX_EVENT_SIZE];

        let err = read_frame(&mut chan, &mut buf, &shutdown).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_end_of_stream_is_an_error() {
        let (mut chan, shutdown) = channel(vec![Step::Frame(vec![])]);
        let mut buf: FrameBuffer = [0; HCI_MAX_EVENT_SIZE];

        let err = read_frame(&mut chan, &mut buf, &shutdown).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}

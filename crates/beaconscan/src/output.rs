//! Beacon record output
//!
//! Each qualifying advertisement becomes one comma-separated line:
//! `<hostname>, <timestamp>, <uuid>, <rssi>, <calibrated power>`.
//! The measured RSSI comes before the calibrated power; the consumer reading
//! these lines depends on that order.

use crate::ibeacon::IBeaconRecord;
use std::ffi::CStr;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the host doing the scanning
pub fn hostname() -> io::Result<String> {
    let mut buf = [0u8; 128];

    let result = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }

    // gethostname does not guarantee termination on truncation
    buf[buf.len() - 1] = 0;
    let name = CStr::from_bytes_until_nul(&buf)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(name.to_string_lossy().into_owned())
}

/// A wall-clock instant rendered as `YYYY-MM-DD HH:MM:SS` local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimestamp(SystemTime);

impl LocalTimestamp {
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        Self(time)
    }

    /// Render as local time.
    ///
    /// Fails when the instant is outside what the C library can represent.
    pub fn format(&self) -> io::Result<String> {
        let secs = match self.0.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => libc::time_t::try_from(elapsed.as_secs()),
            Err(before) => libc::time_t::try_from(before.duration().as_secs()).map(|s| -s),
        }
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut tm: libc::tm = unsafe { std::mem::zeroed() };
        if unsafe { libc::localtime_r(&secs, &mut tm) }.is_null() {
            return Err(io::Error::last_os_error());
        }

        let mut buf = [0u8; 32];
        let written = unsafe {
            libc::strftime(
                buf.as_mut_ptr() as *mut libc::c_char,
                buf.len(),
                c"%Y-%m-%d %H:%M:%S".as_ptr(),
                &tm,
            )
        };
        if written == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "timestamp does not fit the output buffer",
            ));
        }

        String::from_utf8(buf[..written].to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Render one output line, without the trailing newline
pub fn format_line(
    hostname: &str,
    timestamp: &LocalTimestamp,
    record: &IBeaconRecord,
) -> io::Result<String> {
    Ok(format!(
        "{}, {}, {}, {}, {}",
        hostname,
        timestamp.format()?,
        record.uuid_hex(),
        record.rssi,
        record.calibrated_power
    ))
}

/// Writes beacon lines to a sink, flushing after each one
pub struct BeaconWriter<W: Write> {
    out: W,
    hostname: String,
}

impl<W: Write> BeaconWriter<W> {
    pub fn new(out: W, hostname: impl Into<String>) -> Self {
        Self {
            out,
            hostname: hostname.into(),
        }
    }

    pub fn write_record(
        &mut self,
        timestamp: &LocalTimestamp,
        record: &IBeaconRecord,
    ) -> io::Result<()> {
        let line = format_line(&self.hostname, timestamp, record)?;
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record() -> IBeaconRecord {
        IBeaconRecord {
            uuid: core::array::from_fn(|i| i as u8),
            calibrated_power: -59,
            rssi: -72,
        }
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = LocalTimestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(1_400_000_000));
        let text = ts.format().unwrap();

        assert_eq!(text.len(), 19);
        let bytes = text.as_bytes();
        assert_eq!(bytes[4], b'-');
        assert_eq!(bytes[7], b'-');
        assert_eq!(bytes[10], b' ');
        assert_eq!(bytes[13], b':');
        assert_eq!(bytes[16], b':');
        assert!(text.starts_with("2014-05-1"));
    }

    #[test]
    fn test_line_puts_rssi_before_power() {
        let ts = LocalTimestamp::now();
        let line = format_line("pi-scanner", &ts, &record()).unwrap();
        let fields: Vec<&str> = line.split(", ").collect();

        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "pi-scanner");
        assert_eq!(fields[1], ts.format().unwrap());
        assert_eq!(fields[2], "000102030405060708090A0B0C0D0E0F");
        assert_eq!(fields[3], "-72");
        assert_eq!(fields[4], "-59");
    }

    #[test]
    fn test_writer_emits_one_line_per_record() {
        let ts = LocalTimestamp::now();
        let mut writer = BeaconWriter::new(Vec::new(), "host");

        writer.write_record(&ts, &record()).unwrap();
        writer.write_record(&ts, &record()).unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));
        assert!(lines[0].starts_with("host, "));
        assert!(lines[0].ends_with(", -72, -59"));
    }

    #[test]
    fn test_unrepresentable_timestamp_is_an_error() {
        let ts = LocalTimestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(i64::MAX as u64));

        assert!(ts.format().is_err());
        assert!(format_line("host", &ts, &record()).is_err());

        let mut writer = BeaconWriter::new(Vec::new(), "host");
        assert!(writer.write_record(&ts, &record()).is_err());
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn test_hostname_has_no_nul() {
        if let Ok(name) = hostname() {
            assert!(!name.contains('\0'));
        }
    }
}

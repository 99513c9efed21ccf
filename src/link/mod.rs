//! Device connection: a newline-delimited byte stream from the serial port.
//!
//! `SensorLink` is the seam between the acquisition poller and the physical
//! device. The production implementation wraps a serial port handle; tests
//! substitute a scripted link.

use anyhow::{anyhow, Result};
use std::{
    io::{self, BufRead, BufReader},
    time::Duration,
};

/// One line-oriented connection to the sensor device
pub trait SensorLink {
    /// Read one newline-delimited record as raw bytes. The trailing newline
    /// is included when present. An empty read before the port timeout is
    /// reported as `TimedOut`.
    fn read_line(&mut self) -> io::Result<Vec<u8>>;
}

/// Serial port implementation of [`SensorLink`]
pub struct SerialLink {
    reader: BufReader<Box<dyn serialport::SerialPort>>,
}

impl SerialLink {
    pub fn new(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            reader: BufReader::new(port),
        }
    }
}

impl SensorLink for SerialLink {
    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_until(b'\n', &mut buf)?;
        if buf.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "no data received before read timeout",
            ));
        }
        Ok(buf)
    }
}

/// Open the sensor serial port with the requested timeout, enabling
/// exclusive access on Unix systems.
pub fn open_sensor_port(port: &str, baud_rate: u32, timeout: Duration) -> Result<SerialLink> {
    let builder = serialport::new(port, baud_rate).timeout(timeout);

    #[cfg(unix)]
    {
        let mut handle = builder
            .open_native()
            .map_err(|err| anyhow!("Failed to open port {port}: {err}"))?;
        handle
            .set_exclusive(true)
            .map_err(|err| anyhow!("Failed to acquire exclusive access to {port}: {err}"))?;
        Ok(SerialLink::new(Box::new(handle)))
    }

    #[cfg(not(unix))]
    {
        let handle = builder
            .open()
            .map_err(|err| anyhow!("Failed to open port {port}: {err}"))?;
        Ok(SerialLink::new(handle))
    }
}

/// Decode a raw line permissively: invalid UTF-8 byte sequences are dropped
/// rather than replaced or raised.
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let valid_len = err.valid_up_to();
                if let Ok(valid) = std::str::from_utf8(&rest[..valid_len]) {
                    out.push_str(valid);
                }
                let skip = err.error_len().unwrap_or(rest.len() - valid_len);
                rest = &rest[valid_len + skip..];
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_passthrough() {
        assert_eq!(
            decode_dropping_invalid(b"13.39,77.72,10.5,20.1,5.0\n"),
            "13.39,77.72,10.5,20.1,5.0\n"
        );
    }

    #[test]
    fn test_decode_drops_invalid_bytes() {
        // 0xFF is never valid UTF-8; surrounding text must survive
        assert_eq!(
            decode_dropping_invalid(b"13.39,\xFF77.72"),
            "13.39,77.72"
        );
        assert_eq!(decode_dropping_invalid(b"\xFF\xFE"), "");
    }

    #[test]
    fn test_decode_drops_truncated_sequence() {
        // 0xE4 0xB8 is the start of a 3-byte sequence, cut short at the end
        assert_eq!(decode_dropping_invalid(b"42.0\xE4\xB8"), "42.0");
    }
}

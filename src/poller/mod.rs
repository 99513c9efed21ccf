//! Bounded-retry acquisition from the sensor device.
//!
//! One call reads and parses one record: read a line, decode permissively,
//! split on comma, parse the first five fields as floats. A malformed line
//! or read error is recorded to the status log and retried after a fixed
//! delay, up to the configured bound. First success wins.

use anyhow::{anyhow, Result};
use std::{fmt, time::Duration};

use crate::{
    core::logs::{LogEntry, LogLevel, LogMetadata, StatusLog},
    core::reading::SensorReading,
    link::{decode_dropping_invalid, SensorLink},
};

/// Acquisition retry parameters
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Number of read attempts before giving up
    pub max_attempts: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// Why acquisition produced no reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The serial port could not be opened; no attempts were made
    LinkUnavailable,
    /// Every attempt failed to yield a parseable record
    Exhausted { attempts: u32 },
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::LinkUnavailable => write!(f, "sensor link is not available"),
            AcquireError::Exhausted { attempts } => {
                write!(f, "failed to fetch sensor data after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for AcquireError {}

/// Acquire one [`SensorReading`] from the link.
///
/// `None` means the caller could not open the port; that is an immediate
/// failure with zero read attempts. Each raw line and each per-attempt
/// failure is surfaced to `status` as it happens.
pub fn poll(
    link: Option<&mut dyn SensorLink>,
    config: &PollConfig,
    status: &StatusLog,
) -> Result<SensorReading, AcquireError> {
    let Some(link) = link else {
        status.error("Serial port is not available.");
        return Err(AcquireError::LinkUnavailable);
    };

    let max = config.max_attempts;
    for attempt in 1..=max {
        match link.read_line() {
            Ok(bytes) => {
                let line = decode_dropping_invalid(&bytes);
                let line = line.trim();
                status.push(LogEntry::with_metadata(
                    format!("Raw data: {line}"),
                    LogLevel::Info,
                    LogMetadata::Acquisition { attempt },
                ));

                match parse_reading(line) {
                    Ok(reading) => return Ok(reading),
                    Err(err) => status.push(LogEntry::with_metadata(
                        format!("Attempt {attempt}/{max}: {err}"),
                        LogLevel::Warning,
                        LogMetadata::Acquisition { attempt },
                    )),
                }
            }
            Err(err) => status.push(LogEntry::with_metadata(
                format!("Attempt {attempt}/{max}: error reading data: {err}"),
                LogLevel::Warning,
                LogMetadata::Acquisition { attempt },
            )),
        }

        if attempt < max {
            std::thread::sleep(config.retry_delay);
        }
    }

    status.error(format!("Failed to fetch data after {max} attempts."));
    Err(AcquireError::Exhausted { attempts: max })
}

/// Parse one decoded line into a reading.
///
/// Fields are comma-separated, ordered latitude, longitude, distance1-3;
/// trailing fields are ignored. Non-finite values are treated as parse
/// failures like any other malformed field.
pub fn parse_reading(line: &str) -> Result<SensorReading> {
    let line = line.trim();
    if line.is_empty() {
        return Err(anyhow!("Empty line"));
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 5 {
        return Err(anyhow!(
            "Expected at least 5 fields, got {}",
            fields.len()
        ));
    }

    let mut values = [0f64; 5];
    for (i, raw) in fields.iter().take(5).enumerate() {
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| anyhow!("Field {} is not numeric: {raw:?}", i + 1))?;
        if !value.is_finite() {
            return Err(anyhow!("Field {} is not finite: {raw:?}", i + 1));
        }
        values[i] = value;
    }

    Ok(SensorReading {
        latitude: values[0],
        longitude: values[1],
        distance1: values[2],
        distance2: values[3],
        distance3: values[4],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// A link that replays a fixed script of read results
    struct ScriptedLink {
        script: Vec<io::Result<Vec<u8>>>,
        reads: usize,
    }

    impl ScriptedLink {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self { script, reads: 0 }
        }

        fn lines(lines: &[&str]) -> Self {
            Self::new(
                lines
                    .iter()
                    .map(|line| Ok(format!("{line}\n").into_bytes()))
                    .collect(),
            )
        }
    }

    impl SensorLink for ScriptedLink {
        fn read_line(&mut self) -> io::Result<Vec<u8>> {
            self.reads += 1;
            if self.script.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "script exhausted"));
            }
            self.script.remove(0)
        }
    }

    fn fast_config(max_attempts: u32) -> PollConfig {
        PollConfig {
            max_attempts,
            retry_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_first_success_wins() {
        let mut link = ScriptedLink::lines(&["13.39,77.72,10.5,20.1,5.0", "0,0,0,0,0"]);
        let status = StatusLog::new(100);

        let reading = poll(Some(&mut link), &fast_config(5), &status).unwrap();
        assert_eq!(reading.latitude, 13.39);
        assert_eq!(reading.longitude, 77.72);
        assert_eq!(reading.distance1, 10.5);
        assert_eq!(reading.distance2, 20.1);
        assert_eq!(reading.distance3, 5.0);
        assert_eq!(link.reads, 1);
    }

    #[test]
    fn test_trailing_fields_ignored() {
        let mut link = ScriptedLink::lines(&["1.0,2.0,3.0,4.0,5.0,99,checksum"]);
        let status = StatusLog::new(100);

        let reading = poll(Some(&mut link), &fast_config(5), &status).unwrap();
        assert_eq!(reading.distance3, 5.0);
    }

    #[test]
    fn test_malformed_lines_exhaust_attempts() {
        let mut link = ScriptedLink::lines(&["garbage"; 10]);
        let status = StatusLog::new(100);

        let result = poll(Some(&mut link), &fast_config(5), &status);
        assert_eq!(result, Err(AcquireError::Exhausted { attempts: 5 }));
        assert_eq!(link.reads, 5);
    }

    #[test]
    fn test_read_errors_are_retried() {
        let mut link = ScriptedLink::new(vec![
            Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
            Err(io::Error::other("device gone")),
            Ok(b"1.5,2.5,3.5,4.5,5.5\n".to_vec()),
        ]);
        let status = StatusLog::new(100);

        let reading = poll(Some(&mut link), &fast_config(5), &status).unwrap();
        assert_eq!(reading.latitude, 1.5);
        assert_eq!(link.reads, 3);
    }

    #[test]
    fn test_unavailable_link_makes_no_attempts() {
        let status = StatusLog::new(100);
        let result = poll(None, &fast_config(5), &status);
        assert_eq!(result, Err(AcquireError::LinkUnavailable));
    }

    #[test]
    fn test_invalid_bytes_dropped_before_parse() {
        let mut link = ScriptedLink::new(vec![Ok(b"13.39,\xFF77.72,10.5,20.1,5.0\n".to_vec())]);
        let status = StatusLog::new(100);

        let reading = poll(Some(&mut link), &fast_config(5), &status).unwrap();
        assert_eq!(reading.longitude, 77.72);
    }

    #[test]
    fn test_raw_lines_surfaced_to_status_log() {
        let mut link = ScriptedLink::lines(&["short,line", "1.0,2.0,3.0,4.0,5.0"]);
        let status = StatusLog::new(100);

        poll(Some(&mut link), &fast_config(5), &status).unwrap();
        let messages: Vec<String> = status
            .snapshot()
            .into_iter()
            .map(|entry| entry.message)
            .collect();
        assert!(messages.contains(&"Raw data: short,line".to_string()));
        assert!(messages.contains(&"Raw data: 1.0,2.0,3.0,4.0,5.0".to_string()));
        assert!(messages
            .iter()
            .any(|m| m.starts_with("Attempt 1/5: Expected at least 5 fields")));
    }

    #[test]
    fn test_parse_rejects_short_and_non_numeric() {
        assert!(parse_reading("").is_err());
        assert!(parse_reading("1,2,3,4").is_err());
        assert!(parse_reading("a,b,c,d,e").is_err());
        assert!(parse_reading("1,2,3,4,NaN").is_err());
        assert!(parse_reading("1,2,3,4,inf").is_err());
    }

    #[test]
    fn test_parse_tolerates_field_whitespace() {
        let reading = parse_reading(" 1.0 , 2.0 ,3.0,4.0, 5.0 ").unwrap();
        assert_eq!(reading.latitude, 1.0);
        assert_eq!(reading.distance3, 5.0);
    }
}

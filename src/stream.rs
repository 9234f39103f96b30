//! # Stream Processor
//!
//! Routes hex-encoded characteristic values from a line-oriented stream into
//! the decoders and writes one telemetry line per decoded sample.
//!
//! Input lines look like:
//!
//! ```text
//! # characteristic  payload
//! cycling_power     20 00 c8 00 2a 00 00 02
//! 2a53              03:00:02:5a:10:00:64:00:00:00
//! ```
//!
//! Blank lines and `#` comments are skipped. Lines that fail to parse or
//! decode are logged and counted; they never stop the stream.

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{GattError, Result};
use crate::gatt::{self, Characteristic, CyclingPowerMeasurement, Measurement};
use crate::telemetry::{OutputFormat, TelemetryRecord};

/// Counters for a processed stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Lines read, including skipped ones
    pub lines: u64,
    /// Samples decoded and written
    pub decoded: u64,
    /// Lines that failed to parse or decode
    pub rejected: u64,
}

/// Parse a hex payload, ignoring `:`, `-` and whitespace between bytes
///
/// # Errors
///
/// Returns `InvalidPayload` if the remaining characters are not an even number of hex digits
pub fn parse_hex_payload(s: &str) -> Result<Vec<u8>> {
    let digits: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    Ok(hex::decode(digits)?)
}

/// Parse one input line into a characteristic and its raw value
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<(Characteristic, Vec<u8>)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, payload) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| GattError::InvalidPayload(format!("missing payload in {:?}", line)))?;

    let characteristic = name.parse::<Characteristic>()?;
    let payload = parse_hex_payload(payload)?;

    Ok(Some((characteristic, payload)))
}

/// Decodes lines one at a time and derives cadence between cycling power samples
#[derive(Debug)]
pub struct StreamProcessor {
    format: OutputFormat,
    timestamps: bool,
    correct_wraparound: bool,
    previous_power: Option<CyclingPowerMeasurement>,
    stats: StreamStats,
}

impl StreamProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            format: config.output_format(),
            timestamps: config.output.timestamps,
            correct_wraparound: config.cadence.correct_wraparound,
            previous_power: None,
            stats: StreamStats::default(),
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Decode one raw line, rejecting it if it is not valid UTF-8
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for non-UTF-8 input, otherwise as [`Self::process_line`]
    pub fn process_raw_line(&mut self, line: &[u8]) -> Result<Option<TelemetryRecord>> {
        match std::str::from_utf8(line) {
            Ok(line) => self.process_line(line),
            Err(e) => {
                self.stats.lines += 1;
                self.stats.rejected += 1;
                Err(GattError::InvalidPayload(format!("line is not UTF-8: {}", e)))
            }
        }
    }

    /// Decode one line
    ///
    /// Returns `Ok(None)` for skipped lines.
    ///
    /// # Errors
    ///
    /// Returns the parse or decode error for a rejected line
    pub fn process_line(&mut self, line: &str) -> Result<Option<TelemetryRecord>> {
        self.stats.lines += 1;

        let parsed = parse_line(line).and_then(|parsed| {
            parsed
                .map(|(characteristic, payload)| gatt::decode(characteristic, &payload))
                .transpose()
        });

        let measurement = match parsed {
            Ok(Some(measurement)) => measurement,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.stats.rejected += 1;
                return Err(e);
            }
        };

        let mut record = TelemetryRecord::new(measurement);
        if self.timestamps {
            record = record.with_timestamp(Utc::now());
        }

        if let Measurement::CyclingPower(current) = measurement {
            if let Some(previous) = self.previous_power.replace(current) {
                let cadence = if self.correct_wraparound {
                    gatt::cadence(&current, &previous)
                } else {
                    gatt::cadence_unwrapped(&current, &previous)
                };
                if cadence != gatt::CADENCE_UNAVAILABLE {
                    record = record.with_cadence(cadence);
                }
            }
        }

        self.stats.decoded += 1;
        Ok(Some(record))
    }

    /// Render a record in the configured format, newline terminated
    pub fn render(&self, record: &TelemetryRecord) -> Result<String> {
        let mut line = record.render(self.format)?;
        line.push('\n');
        Ok(line)
    }
}

/// Process every line of `reader`, writing telemetry lines to `writer`
///
/// # Errors
///
/// Returns error only for I/O failures on the reader or writer
pub async fn process_stream<R, W>(mut reader: R, writer: &mut W, config: &Config) -> Result<StreamStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut processor = StreamProcessor::new(config);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }

        match processor.process_raw_line(&line) {
            Ok(Some(record)) => {
                debug!(characteristic = %record.characteristic, "Decoded sample");
                let rendered = processor.render(&record)?;
                writer.write_all(rendered.as_bytes()).await?;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(line = processor.stats().lines, "Rejected input line: {}", e);
            }
        }
    }

    writer.flush().await?;
    Ok(processor.stats())
}

//! # Telemetry Module
//!
//! Renders decoded measurements as JSON Lines or plain text.
//!
//! This module handles:
//! - Wrapping a decoded measurement with its characteristic and timestamp
//! - Attaching derived cadence to cycling power samples
//! - Formatting one record per line

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::gatt::{Characteristic, Measurement};

/// Output line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    JsonLines,
    /// Human-readable summary per line
    Text,
}

impl OutputFormat {
    /// Look up a format by its configuration name (`jsonl`, `text`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "jsonl" => Some(OutputFormat::JsonLines),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

/// A decoded sample ready for output
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    /// Time the sample was decoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    pub characteristic: Characteristic,

    pub measurement: Measurement,

    /// Cadence derived against the previous cycling power sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<i32>,
}

impl TelemetryRecord {
    pub fn new(measurement: Measurement) -> Self {
        Self {
            timestamp: None,
            characteristic: measurement.characteristic(),
            measurement,
            cadence: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_cadence(mut self, cadence: i32) -> Self {
        self.cadence = Some(cadence);
        self
    }

    /// Render as a single line without trailing newline
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::JsonLines => Ok(serde_json::to_string(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut line = String::new();
        if let Some(timestamp) = self.timestamp {
            line.push_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
            line.push(' ');
        }
        line.push_str(&format!("[{}] {}", self.characteristic, self.measurement));
        if let Some(cadence) = self.cadence {
            line.push_str(&format!(", cadence {}", cadence));
        }
        line
    }
}

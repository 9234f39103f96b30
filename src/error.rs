//! # Error Types
//!
//! Custom error types for gatt-measure using `thiserror`.

use thiserror::Error;

/// Main error type for gatt-measure
#[derive(Debug, Error)]
pub enum GattError {
    /// A read needed more bytes than the payload has left
    #[error("Out of range: read of {requested} bytes at offset {offset}, {remaining} remaining")]
    OutOfRange {
        /// Width of the attempted read in bytes
        requested: usize,
        /// Bytes left in the payload at the time of the read
        remaining: usize,
        /// Cursor position of the failed read
        offset: usize,
    },

    /// Characteristic name or UUID not handled by this crate
    #[error("Unknown characteristic: {0}")]
    UnknownCharacteristic(String),

    /// Input line or hex payload could not be parsed
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GattError {
    /// Returns true for a structural decode failure (truncated payload)
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, GattError::OutOfRange { .. })
    }
}

impl From<hex::FromHexError> for GattError {
    fn from(err: hex::FromHexError) -> Self {
        GattError::InvalidPayload(format!("hex: {}", err))
    }
}

/// Result type alias for gatt-measure
pub type Result<T> = std::result::Result<T, GattError>;

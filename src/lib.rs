//! # gatt-measure Library
//!
//! Decode Bluetooth GATT cycling power and running speed/cadence measurements.
//!
//! This library turns raw characteristic values, as delivered by a GATT read
//! or notification, into typed, unit-annotated measurement records. The
//! transport that delivers the bytes is left to the caller.
//!
//! ```no_run
//! use gatt_measure::gatt::{decode_cycling_power, decode_running_speed_cadence};
//!
//! let power = decode_cycling_power(&[0x00, 0x00, 0x2C, 0x01])?;
//! assert_eq!(power.total_instantaneous_power, 300);
//!
//! let rsc = decode_running_speed_cadence(&[0x00, 0x00, 0x02, 0x5A])?;
//! assert_eq!(rsc.instantaneous_cadence, 90);
//! # Ok::<(), gatt_measure::error::GattError>(())
//! ```

pub mod config;
pub mod error;
pub mod gatt;
pub mod stream;
pub mod telemetry;

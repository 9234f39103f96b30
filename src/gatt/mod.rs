//! # GATT Measurement Module
//!
//! Decoding of Bluetooth GATT measurement characteristic values.
//!
//! This module handles:
//! - Cycling Power Measurement (0x2A63), 13 flag bits
//! - Running Speed and Cadence Measurement (0x2A53), 3 flag bits
//! - Cadence derivation between two cycling power samples
//! - Encoding measurements back into characteristic values

pub mod characteristic;
pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod protocol;

pub use characteristic::{decode, Characteristic, Measurement};
pub use cursor::ByteCursor;
pub use decoder::{cadence, cadence_unwrapped, decode_cycling_power, decode_running_speed_cadence};
pub use protocol::{
    CyclingPowerFlags, CyclingPowerMeasurement, RunningSpeedCadenceFlags,
    RunningSpeedCadenceMeasurement, CADENCE_UNAVAILABLE,
};

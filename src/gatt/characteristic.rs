//! # Characteristic Registry
//!
//! Maps GATT characteristic identifiers to their decoders.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::decoder::{decode_cycling_power, decode_running_speed_cadence};
use super::protocol::*;
use crate::error::{GattError, Result};

/// Measurement characteristics this crate can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Characteristic {
    /// Cycling Power Measurement (0x2A63)
    #[serde(rename = "cycling_power")]
    CyclingPowerMeasurement,

    /// Running Speed and Cadence Measurement (0x2A53)
    #[serde(rename = "running_speed_cadence")]
    RunningSpeedCadenceMeasurement,
}

impl Characteristic {
    /// Every supported characteristic
    pub const ALL: [Characteristic; 2] = [
        Characteristic::CyclingPowerMeasurement,
        Characteristic::RunningSpeedCadenceMeasurement,
    ];

    /// 16-bit SIG assigned number
    pub fn assigned_number(&self) -> u16 {
        match self {
            Characteristic::CyclingPowerMeasurement => CYCLING_POWER_MEASUREMENT_UUID16,
            Characteristic::RunningSpeedCadenceMeasurement => RSC_MEASUREMENT_UUID16,
        }
    }

    /// Full 128-bit UUID on the Bluetooth base UUID
    pub fn uuid(&self) -> Uuid {
        uuid_from_assigned_number(self.assigned_number())
    }

    /// Symbolic name, as accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            Characteristic::CyclingPowerMeasurement => "cycling_power",
            Characteristic::RunningSpeedCadenceMeasurement => "running_speed_cadence",
        }
    }

    pub fn from_assigned_number(number: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.assigned_number() == number)
    }

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }
}

/// Expand a 16-bit assigned number onto the Bluetooth base UUID
pub fn uuid_from_assigned_number(number: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((number as u128) << 96))
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Characteristic {
    type Err = GattError;

    /// Accepts a symbolic name (`cycling_power`), a 16-bit assigned number in
    /// hex (`2a63`, `0x2A63`) or a full UUID.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();

        if let Some(c) = Self::ALL.into_iter().find(|c| c.name() == lower) {
            return Ok(c);
        }

        let short = lower.strip_prefix("0x").unwrap_or(&lower);
        if short.len() == 4 {
            if let Ok(number) = u16::from_str_radix(short, 16) {
                return Self::from_assigned_number(number)
                    .ok_or_else(|| GattError::UnknownCharacteristic(s.to_string()));
            }
        }

        Uuid::parse_str(s)
            .ok()
            .and_then(Self::from_uuid)
            .ok_or_else(|| GattError::UnknownCharacteristic(s.to_string()))
    }
}

/// A decoded measurement of any supported characteristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measurement {
    CyclingPower(CyclingPowerMeasurement),
    RunningSpeedCadence(RunningSpeedCadenceMeasurement),
}

impl Measurement {
    /// Characteristic this measurement was decoded from
    pub fn characteristic(&self) -> Characteristic {
        match self {
            Measurement::CyclingPower(_) => Characteristic::CyclingPowerMeasurement,
            Measurement::RunningSpeedCadence(_) => Characteristic::RunningSpeedCadenceMeasurement,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::CyclingPower(m) => fmt::Display::fmt(m, f),
            Measurement::RunningSpeedCadence(m) => fmt::Display::fmt(m, f),
        }
    }
}

/// Decode a characteristic value with the decoder for `characteristic`
///
/// # Errors
///
/// Returns `OutOfRange` if the payload is too short for its declared fields
pub fn decode(characteristic: Characteristic, payload: &[u8]) -> Result<Measurement> {
    match characteristic {
        Characteristic::CyclingPowerMeasurement => {
            decode_cycling_power(payload).map(Measurement::CyclingPower)
        }
        Characteristic::RunningSpeedCadenceMeasurement => {
            decode_running_speed_cadence(payload).map(Measurement::RunningSpeedCadence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuids() {
        assert_eq!(
            Characteristic::CyclingPowerMeasurement.uuid().to_string(),
            "00002a63-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            Characteristic::RunningSpeedCadenceMeasurement.uuid().to_string(),
            "00002a53-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_from_assigned_number() {
        assert_eq!(
            Characteristic::from_assigned_number(0x2A63),
            Some(Characteristic::CyclingPowerMeasurement)
        );
        assert_eq!(
            Characteristic::from_assigned_number(0x2A53),
            Some(Characteristic::RunningSpeedCadenceMeasurement)
        );
        assert_eq!(Characteristic::from_assigned_number(0x2A37), None);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = uuid_from_assigned_number(0x2A53);
        assert_eq!(
            Characteristic::from_uuid(uuid),
            Some(Characteristic::RunningSpeedCadenceMeasurement)
        );
        assert_eq!(Characteristic::from_uuid(Uuid::nil()), None);
    }

    #[test]
    fn test_parse_names_and_numbers() {
        for input in ["cycling_power", "CYCLING_POWER", "2a63", "0x2A63", " 2A63 "] {
            assert_eq!(
                input.parse::<Characteristic>().unwrap(),
                Characteristic::CyclingPowerMeasurement,
                "input {:?}",
                input
            );
        }
        for input in [
            "running_speed_cadence",
            "2a53",
            "00002a53-0000-1000-8000-00805f9b34fb",
        ] {
            assert_eq!(
                input.parse::<Characteristic>().unwrap(),
                Characteristic::RunningSpeedCadenceMeasurement
            );
        }
    }

    #[test]
    fn test_parse_unknown() {
        for input in ["", "heart_rate", "2a37", "0x", "00002a37-0000-1000-8000-00805f9b34fb"] {
            match input.parse::<Characteristic>() {
                Err(GattError::UnknownCharacteristic(_)) => {}
                other => panic!("{:?}: expected UnknownCharacteristic, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for c in Characteristic::ALL {
            assert_eq!(c.to_string().parse::<Characteristic>().unwrap(), c);
        }
    }

    #[test]
    fn test_decode_dispatch() {
        let m = decode(Characteristic::CyclingPowerMeasurement, &[0x00, 0x00, 0x2C, 0x01]).unwrap();
        assert_eq!(m.characteristic(), Characteristic::CyclingPowerMeasurement);
        match m {
            Measurement::CyclingPower(cp) => assert_eq!(cp.total_instantaneous_power, 300),
            other => panic!("Expected cycling power, got {:?}", other),
        }

        let m = decode(
            Characteristic::RunningSpeedCadenceMeasurement,
            &[0x00, 0x00, 0x02, 0x5A],
        )
        .unwrap();
        assert_eq!(m.characteristic(), Characteristic::RunningSpeedCadenceMeasurement);
        assert_eq!(m.to_string(), "walking 2.00 m/s, cadence 90/min");
    }

    #[test]
    fn test_decode_dispatch_out_of_range() {
        let err = decode(Characteristic::RunningSpeedCadenceMeasurement, &[0x00, 0x00]).unwrap_err();
        assert!(err.is_out_of_range());
    }
}

//! # GATT Protocol Constants and Types
//!
//! Flag bits, field widths, unit scales and decoded record types for the
//! Cycling Power Measurement and Running Speed and Cadence Measurement
//! characteristics.

use serde::Serialize;
use std::fmt;

/// Bluetooth base UUID (`00000000-0000-1000-8000-00805f9b34fb`)
///
/// A 16-bit assigned number `xxxx` expands to `0000xxxx-0000-1000-8000-00805f9b34fb`.
pub const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// Cycling Power Measurement characteristic assigned number
pub const CYCLING_POWER_MEASUREMENT_UUID16: u16 = 0x2A63;

/// Running Speed and Cadence Measurement characteristic assigned number
pub const RSC_MEASUREMENT_UUID16: u16 = 0x2A53;

// Cycling Power Measurement flags (16 bits, little-endian).
// Bits 0-7 come from the first flags byte, bits 8-12 from the second.

/// Pedal power balance field present
pub const CPM_FLAG_PEDAL_POWER_BALANCE_PRESENT: u16 = 1 << 0;
/// Pedal power balance reference (0 = unknown, 1 = left)
pub const CPM_FLAG_PEDAL_POWER_BALANCE_REFERENCE: u16 = 1 << 1;
/// Accumulated torque field present
pub const CPM_FLAG_ACCUMULATED_TORQUE_PRESENT: u16 = 1 << 2;
/// Accumulated torque source (0 = wheel based, 1 = crank based)
pub const CPM_FLAG_ACCUMULATED_TORQUE_SOURCE: u16 = 1 << 3;
/// Wheel revolution data present
pub const CPM_FLAG_WHEEL_REVOLUTION_DATA_PRESENT: u16 = 1 << 4;
/// Crank revolution data present
pub const CPM_FLAG_CRANK_REVOLUTION_DATA_PRESENT: u16 = 1 << 5;
/// Extreme force magnitudes present
pub const CPM_FLAG_EXTREME_FORCE_MAGNITUDES_PRESENT: u16 = 1 << 6;
/// Extreme torque magnitudes present
pub const CPM_FLAG_EXTREME_TORQUE_MAGNITUDES_PRESENT: u16 = 1 << 7;
/// Extreme angles present
pub const CPM_FLAG_EXTREME_ANGLES_PRESENT: u16 = 1 << 8;
/// Top dead spot angle present
pub const CPM_FLAG_TOP_DEAD_SPOT_ANGLE_PRESENT: u16 = 1 << 9;
/// Bottom dead spot angle present
pub const CPM_FLAG_BOTTOM_DEAD_SPOT_ANGLE_PRESENT: u16 = 1 << 10;
/// Accumulated energy present
pub const CPM_FLAG_ACCUMULATED_ENERGY_PRESENT: u16 = 1 << 11;
/// Offset compensation indicator
pub const CPM_FLAG_OFFSET_COMPENSATION_INDICATOR: u16 = 1 << 12;

/// Cycling Power flag bits in declaration order
pub const CPM_FLAG_NAMES: [(u16, &str); 13] = [
    (CPM_FLAG_PEDAL_POWER_BALANCE_PRESENT, "pedal_power_balance_present"),
    (CPM_FLAG_PEDAL_POWER_BALANCE_REFERENCE, "pedal_power_balance_reference"),
    (CPM_FLAG_ACCUMULATED_TORQUE_PRESENT, "accumulated_torque_present"),
    (CPM_FLAG_ACCUMULATED_TORQUE_SOURCE, "accumulated_torque_source"),
    (CPM_FLAG_WHEEL_REVOLUTION_DATA_PRESENT, "wheel_revolution_data_present"),
    (CPM_FLAG_CRANK_REVOLUTION_DATA_PRESENT, "crank_revolution_data_present"),
    (CPM_FLAG_EXTREME_FORCE_MAGNITUDES_PRESENT, "extreme_force_magnitudes_present"),
    (CPM_FLAG_EXTREME_TORQUE_MAGNITUDES_PRESENT, "extreme_torque_magnitudes_present"),
    (CPM_FLAG_EXTREME_ANGLES_PRESENT, "extreme_angles_present"),
    (CPM_FLAG_TOP_DEAD_SPOT_ANGLE_PRESENT, "top_dead_spot_angle_present"),
    (CPM_FLAG_BOTTOM_DEAD_SPOT_ANGLE_PRESENT, "bottom_dead_spot_angle_present"),
    (CPM_FLAG_ACCUMULATED_ENERGY_PRESENT, "accumulated_energy_present"),
    (CPM_FLAG_OFFSET_COMPENSATION_INDICATOR, "offset_compensation_indicator"),
];

/// Cycling Power mandatory part: flags(2) + instantaneous power(2)
pub const CPM_MIN_PAYLOAD_SIZE: usize = 4;

/// Width in bytes of each optional Cycling Power field group, keyed by its presence bit
pub const CPM_OPTIONAL_FIELD_WIDTHS: [(u16, usize); 10] = [
    (CPM_FLAG_PEDAL_POWER_BALANCE_PRESENT, 1),
    (CPM_FLAG_ACCUMULATED_TORQUE_PRESENT, 2),
    (CPM_FLAG_WHEEL_REVOLUTION_DATA_PRESENT, 6),
    (CPM_FLAG_CRANK_REVOLUTION_DATA_PRESENT, 4),
    (CPM_FLAG_EXTREME_FORCE_MAGNITUDES_PRESENT, 4),
    (CPM_FLAG_EXTREME_TORQUE_MAGNITUDES_PRESENT, 4),
    (CPM_FLAG_EXTREME_ANGLES_PRESENT, 3),
    (CPM_FLAG_TOP_DEAD_SPOT_ANGLE_PRESENT, 2),
    (CPM_FLAG_BOTTOM_DEAD_SPOT_ANGLE_PRESENT, 2),
    (CPM_FLAG_ACCUMULATED_ENERGY_PRESENT, 2),
];

/// Pedal power balance resolution (1/2 %)
pub const CPM_PEDAL_POWER_BALANCE_SCALE: f32 = 2.0;

/// Accumulated torque resolution (1/32 N·m)
pub const CPM_ACCUMULATED_TORQUE_SCALE: f32 = 32.0;

/// Wheel event time ticks per second
pub const CPM_WHEEL_EVENT_TIME_RESOLUTION: u32 = 2048;

/// Crank event time ticks per second
pub const CPM_CRANK_EVENT_TIME_RESOLUTION: u32 = 1024;

/// Returned by the cadence computation when it cannot be derived
pub const CADENCE_UNAVAILABLE: i32 = -1;

// Running Speed and Cadence Measurement flags (8 bits).

/// Instantaneous stride length present
pub const RSC_FLAG_STRIDE_LENGTH_PRESENT: u8 = 1 << 0;
/// Total distance present
pub const RSC_FLAG_TOTAL_DISTANCE_PRESENT: u8 = 1 << 1;
/// Walking (0) or running (1)
pub const RSC_FLAG_RUNNING: u8 = 1 << 2;

/// Running Speed and Cadence flag bits in declaration order
pub const RSC_FLAG_NAMES: [(u8, &str); 3] = [
    (RSC_FLAG_STRIDE_LENGTH_PRESENT, "instantaneous_stride_length_present"),
    (RSC_FLAG_TOTAL_DISTANCE_PRESENT, "total_distance_present"),
    (RSC_FLAG_RUNNING, "is_running"),
];

/// RSC mandatory part: flags(1) + speed(2) + cadence(1)
pub const RSC_MIN_PAYLOAD_SIZE: usize = 4;

/// Width in bytes of each optional RSC field, keyed by its presence bit
pub const RSC_OPTIONAL_FIELD_WIDTHS: [(u8, usize); 2] = [
    (RSC_FLAG_STRIDE_LENGTH_PRESENT, 2),
    (RSC_FLAG_TOTAL_DISTANCE_PRESENT, 4),
];

/// Instantaneous speed resolution (1/256 m/s)
pub const RSC_SPEED_SCALE: f32 = 256.0;

/// Total distance resolution (1/10 m)
pub const RSC_DISTANCE_SCALE: u32 = 10;

/// Largest cumulative crank revolution count before the counter wraps
pub const MAX_CUMULATIVE_CRANK_REVS: u16 = u16::MAX;

/// Largest cumulative wheel revolution count before the counter wraps
pub const MAX_CUMULATIVE_WHEEL_REVS: u32 = u32::MAX;

/// Flags of a Cycling Power Measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CyclingPowerFlags {
    pub pedal_power_balance_present: bool,
    /// Balance refers to the left pedal when set
    pub pedal_power_balance_reference: bool,
    pub accumulated_torque_present: bool,
    /// Torque is crank based when set, wheel based otherwise
    pub accumulated_torque_source: bool,
    pub wheel_revolution_data_present: bool,
    pub crank_revolution_data_present: bool,
    pub extreme_force_magnitudes_present: bool,
    pub extreme_torque_magnitudes_present: bool,
    pub extreme_angles_present: bool,
    pub top_dead_spot_angle_present: bool,
    pub bottom_dead_spot_angle_present: bool,
    pub accumulated_energy_present: bool,
    pub offset_compensation_indicator: bool,
}

impl CyclingPowerFlags {
    /// Derive the named indicators from raw flag bits. Reserved bits are ignored.
    pub fn from_bits(bits: u16) -> Self {
        let set = |mask: u16| bits & mask != 0;

        Self {
            pedal_power_balance_present: set(CPM_FLAG_PEDAL_POWER_BALANCE_PRESENT),
            pedal_power_balance_reference: set(CPM_FLAG_PEDAL_POWER_BALANCE_REFERENCE),
            accumulated_torque_present: set(CPM_FLAG_ACCUMULATED_TORQUE_PRESENT),
            accumulated_torque_source: set(CPM_FLAG_ACCUMULATED_TORQUE_SOURCE),
            wheel_revolution_data_present: set(CPM_FLAG_WHEEL_REVOLUTION_DATA_PRESENT),
            crank_revolution_data_present: set(CPM_FLAG_CRANK_REVOLUTION_DATA_PRESENT),
            extreme_force_magnitudes_present: set(CPM_FLAG_EXTREME_FORCE_MAGNITUDES_PRESENT),
            extreme_torque_magnitudes_present: set(CPM_FLAG_EXTREME_TORQUE_MAGNITUDES_PRESENT),
            extreme_angles_present: set(CPM_FLAG_EXTREME_ANGLES_PRESENT),
            top_dead_spot_angle_present: set(CPM_FLAG_TOP_DEAD_SPOT_ANGLE_PRESENT),
            bottom_dead_spot_angle_present: set(CPM_FLAG_BOTTOM_DEAD_SPOT_ANGLE_PRESENT),
            accumulated_energy_present: set(CPM_FLAG_ACCUMULATED_ENERGY_PRESENT),
            offset_compensation_indicator: set(CPM_FLAG_OFFSET_COMPENSATION_INDICATOR),
        }
    }

    /// Raw flag bits for the indicators that are set
    pub fn bits(&self) -> u16 {
        let values = [
            self.pedal_power_balance_present,
            self.pedal_power_balance_reference,
            self.accumulated_torque_present,
            self.accumulated_torque_source,
            self.wheel_revolution_data_present,
            self.crank_revolution_data_present,
            self.extreme_force_magnitudes_present,
            self.extreme_torque_magnitudes_present,
            self.extreme_angles_present,
            self.top_dead_spot_angle_present,
            self.bottom_dead_spot_angle_present,
            self.accumulated_energy_present,
            self.offset_compensation_indicator,
        ];

        CPM_FLAG_NAMES
            .iter()
            .zip(values)
            .filter(|(_, set)| *set)
            .fold(0, |bits, ((mask, _), _)| bits | mask)
    }

    /// Names of the set indicators, in declaration order
    pub fn set_names(&self) -> Vec<&'static str> {
        let bits = self.bits();
        CPM_FLAG_NAMES
            .iter()
            .filter(|(mask, _)| bits & mask != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Total payload length these flags declare
    pub fn payload_len(&self) -> usize {
        let bits = self.bits();
        CPM_MIN_PAYLOAD_SIZE
            + CPM_OPTIONAL_FIELD_WIDTHS
                .iter()
                .filter(|(mask, _)| bits & mask != 0)
                .map(|(_, width)| width)
                .sum::<usize>()
    }
}

/// Decoded Cycling Power Measurement (0x2A63)
///
/// Fields whose presence flag is clear hold zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CyclingPowerMeasurement {
    pub flags: CyclingPowerFlags,

    /// Instantaneous power as transmitted, in watts
    pub distributed_instantaneous_power: i16,

    /// Total instantaneous power in watts
    ///
    /// Equal to the distributed power unless pedal power balance is present,
    /// in which case it is `distributed * 100 / balance`.
    pub total_instantaneous_power: i32,

    /// Pedal power balance in percent
    pub pedal_power_balance: f32,

    /// Accumulated torque in N·m
    pub accumulated_torque: f32,

    /// Cumulative wheel revolutions
    pub cumulative_wheel_revolutions: u32,

    /// Last wheel event time, 1/2048 s
    pub last_wheel_event_time: u16,

    /// Cumulative crank revolutions
    pub cumulative_crank_revolutions: u16,

    /// Last crank event time, 1/1024 s
    pub last_crank_event_time: u16,

    /// Maximum force magnitude in newtons
    pub max_force_magnitude: i16,

    /// Minimum force magnitude in newtons
    pub min_force_magnitude: i16,

    /// Maximum torque magnitude in N·m
    pub max_torque_magnitude: i16,

    /// Minimum torque magnitude in N·m
    pub min_torque_magnitude: i16,

    /// Angle of maximum force in degrees (12 bits)
    pub max_angle: u16,

    /// Angle of minimum force in degrees (12 bits)
    pub min_angle: u16,

    /// Top dead spot angle in degrees
    pub top_dead_spot_angle: u16,

    /// Bottom dead spot angle in degrees
    pub bottom_dead_spot_angle: u16,

    /// Accumulated energy in kJ
    pub accumulated_energy: u16,
}

impl CyclingPowerMeasurement {
    /// Last wheel event time in seconds
    pub fn last_wheel_event_time_secs(&self) -> f64 {
        self.last_wheel_event_time as f64 / CPM_WHEEL_EVENT_TIME_RESOLUTION as f64
    }

    /// Last crank event time in seconds
    pub fn last_crank_event_time_secs(&self) -> f64 {
        self.last_crank_event_time as f64 / CPM_CRANK_EVENT_TIME_RESOLUTION as f64
    }
}

impl fmt::Display for CyclingPowerMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = &self.flags;

        write!(f, "power {} W", self.total_instantaneous_power)?;
        if flags.pedal_power_balance_present {
            write!(
                f,
                " (distributed {} W, balance {:.1}%)",
                self.distributed_instantaneous_power, self.pedal_power_balance
            )?;
        }
        if flags.accumulated_torque_present {
            write!(f, ", torque {:.2} N·m", self.accumulated_torque)?;
        }
        if flags.wheel_revolution_data_present {
            write!(
                f,
                ", wheel {} revs @ {:.3} s",
                self.cumulative_wheel_revolutions,
                self.last_wheel_event_time_secs()
            )?;
        }
        if flags.crank_revolution_data_present {
            write!(
                f,
                ", crank {} revs @ {:.3} s",
                self.cumulative_crank_revolutions,
                self.last_crank_event_time_secs()
            )?;
        }
        if flags.extreme_force_magnitudes_present {
            write!(
                f,
                ", force {}..{} N",
                self.min_force_magnitude, self.max_force_magnitude
            )?;
        }
        if flags.extreme_torque_magnitudes_present {
            write!(
                f,
                ", torque {}..{} N·m",
                self.min_torque_magnitude, self.max_torque_magnitude
            )?;
        }
        if flags.extreme_angles_present {
            write!(f, ", angles max {}° min {}°", self.max_angle, self.min_angle)?;
        }
        if flags.top_dead_spot_angle_present {
            write!(f, ", top dead spot {}°", self.top_dead_spot_angle)?;
        }
        if flags.bottom_dead_spot_angle_present {
            write!(f, ", bottom dead spot {}°", self.bottom_dead_spot_angle)?;
        }
        if flags.accumulated_energy_present {
            write!(f, ", energy {} kJ", self.accumulated_energy)?;
        }
        Ok(())
    }
}

/// Flags of a Running Speed and Cadence Measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunningSpeedCadenceFlags {
    pub instantaneous_stride_length_present: bool,
    pub total_distance_present: bool,
    /// Running when set, walking otherwise
    pub is_running: bool,
}

impl RunningSpeedCadenceFlags {
    /// Derive the named indicators from the raw flags byte. Reserved bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            instantaneous_stride_length_present: bits & RSC_FLAG_STRIDE_LENGTH_PRESENT != 0,
            total_distance_present: bits & RSC_FLAG_TOTAL_DISTANCE_PRESENT != 0,
            is_running: bits & RSC_FLAG_RUNNING != 0,
        }
    }

    /// Raw flags byte for the indicators that are set
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.instantaneous_stride_length_present {
            bits |= RSC_FLAG_STRIDE_LENGTH_PRESENT;
        }
        if self.total_distance_present {
            bits |= RSC_FLAG_TOTAL_DISTANCE_PRESENT;
        }
        if self.is_running {
            bits |= RSC_FLAG_RUNNING;
        }
        bits
    }

    /// Names of the set indicators, in declaration order
    pub fn set_names(&self) -> Vec<&'static str> {
        let bits = self.bits();
        RSC_FLAG_NAMES
            .iter()
            .filter(|(mask, _)| bits & mask != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Total payload length these flags declare
    pub fn payload_len(&self) -> usize {
        let bits = self.bits();
        RSC_MIN_PAYLOAD_SIZE
            + RSC_OPTIONAL_FIELD_WIDTHS
                .iter()
                .filter(|(mask, _)| bits & mask != 0)
                .map(|(_, width)| width)
                .sum::<usize>()
    }
}

/// Decoded Running Speed and Cadence Measurement (0x2A53)
///
/// Fields whose presence flag is clear hold zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunningSpeedCadenceMeasurement {
    pub flags: RunningSpeedCadenceFlags,

    /// Instantaneous speed in m/s
    pub instantaneous_speed: f32,

    /// Instantaneous cadence in steps per minute
    pub instantaneous_cadence: u8,

    /// Instantaneous stride length in cm
    pub instantaneous_stride_length: u16,

    /// Total distance in metres
    pub total_distance: u32,
}

impl fmt::Display for RunningSpeedCadenceMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2} m/s, cadence {}/min",
            if self.flags.is_running { "running" } else { "walking" },
            self.instantaneous_speed,
            self.instantaneous_cadence
        )?;
        if self.flags.instantaneous_stride_length_present {
            write!(f, ", stride {} cm", self.instantaneous_stride_length)?;
        }
        if self.flags.total_distance_present {
            write!(f, ", distance {} m", self.total_distance)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_constants() {
        assert_eq!(CYCLING_POWER_MEASUREMENT_UUID16, 0x2A63);
        assert_eq!(RSC_MEASUREMENT_UUID16, 0x2A53);
        assert_eq!(CADENCE_UNAVAILABLE, -1);
    }

    #[test]
    fn test_cycling_flag_bits_are_distinct() {
        let all = CPM_FLAG_NAMES.iter().fold(0u16, |acc, (mask, _)| {
            assert_eq!(acc & mask, 0, "bit {:#06x} declared twice", mask);
            acc | mask
        });
        assert_eq!(all, 0x1FFF);
    }

    #[test]
    fn test_cycling_flags_from_bits() {
        let flags = CyclingPowerFlags::from_bits(
            CPM_FLAG_CRANK_REVOLUTION_DATA_PRESENT | CPM_FLAG_EXTREME_ANGLES_PRESENT,
        );
        assert!(flags.crank_revolution_data_present);
        assert!(flags.extreme_angles_present);
        assert!(!flags.pedal_power_balance_present);
        assert!(!flags.accumulated_energy_present);
    }

    #[test]
    fn test_cycling_flags_ignore_reserved_bits() {
        let flags = CyclingPowerFlags::from_bits(0xE000);
        assert_eq!(flags, CyclingPowerFlags::default());
        assert_eq!(flags.bits(), 0);
    }

    #[test]
    fn test_cycling_flags_bits_roundtrip() {
        for bits in 0..=0x1FFFu16 {
            assert_eq!(CyclingPowerFlags::from_bits(bits).bits(), bits);
        }
    }

    #[test]
    fn test_cycling_flags_set_names() {
        let flags = CyclingPowerFlags::from_bits(
            CPM_FLAG_OFFSET_COMPENSATION_INDICATOR | CPM_FLAG_PEDAL_POWER_BALANCE_PRESENT,
        );
        assert_eq!(
            flags.set_names(),
            vec!["pedal_power_balance_present", "offset_compensation_indicator"]
        );
    }

    #[test]
    fn test_cycling_payload_len() {
        assert_eq!(CyclingPowerFlags::default().payload_len(), 4);
        // Semantic-only bits do not add fields
        let flags = CyclingPowerFlags::from_bits(
            CPM_FLAG_PEDAL_POWER_BALANCE_REFERENCE
                | CPM_FLAG_ACCUMULATED_TORQUE_SOURCE
                | CPM_FLAG_OFFSET_COMPENSATION_INDICATOR,
        );
        assert_eq!(flags.payload_len(), 4);
        // Everything present: 4 + 1 + 2 + 6 + 4 + 4 + 4 + 3 + 2 + 2 + 2
        assert_eq!(CyclingPowerFlags::from_bits(0x1FFF).payload_len(), 34);
    }

    #[test]
    fn test_running_flags() {
        let flags = RunningSpeedCadenceFlags::from_bits(0xFC | RSC_FLAG_RUNNING);
        assert!(flags.is_running);
        assert!(!flags.instantaneous_stride_length_present);
        assert!(!flags.total_distance_present);
        assert_eq!(flags.bits(), RSC_FLAG_RUNNING);
        assert_eq!(flags.set_names(), vec!["is_running"]);
    }

    #[test]
    fn test_running_payload_len() {
        assert_eq!(RunningSpeedCadenceFlags::from_bits(0).payload_len(), 4);
        assert_eq!(RunningSpeedCadenceFlags::from_bits(0x01).payload_len(), 6);
        assert_eq!(RunningSpeedCadenceFlags::from_bits(0x02).payload_len(), 8);
        assert_eq!(RunningSpeedCadenceFlags::from_bits(0x07).payload_len(), 10);
    }

    #[test]
    fn test_event_time_seconds() {
        let measurement = CyclingPowerMeasurement {
            last_wheel_event_time: 4096,
            last_crank_event_time: 512,
            ..Default::default()
        };
        assert_eq!(measurement.last_wheel_event_time_secs(), 2.0);
        assert_eq!(measurement.last_crank_event_time_secs(), 0.5);
    }

    #[test]
    fn test_cycling_display_only_present_fields() {
        let measurement = CyclingPowerMeasurement {
            flags: CyclingPowerFlags::from_bits(CPM_FLAG_ACCUMULATED_ENERGY_PRESENT),
            distributed_instantaneous_power: 250,
            total_instantaneous_power: 250,
            accumulated_energy: 42,
            ..Default::default()
        };
        assert_eq!(measurement.to_string(), "power 250 W, energy 42 kJ");
    }

    #[test]
    fn test_running_display() {
        let measurement = RunningSpeedCadenceMeasurement {
            flags: RunningSpeedCadenceFlags::from_bits(0x07),
            instantaneous_speed: 3.5,
            instantaneous_cadence: 172,
            instantaneous_stride_length: 120,
            total_distance: 5000,
        };
        assert_eq!(
            measurement.to_string(),
            "running 3.50 m/s, cadence 172/min, stride 120 cm, distance 5000 m"
        );
    }
}

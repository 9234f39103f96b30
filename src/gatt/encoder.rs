//! # GATT Measurement Encoder
//!
//! Serializes decoded measurements back into characteristic values. Used to
//! build test vectors and to simulate sensors.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::*;

/// Encode a Cycling Power Measurement into its characteristic value
///
/// Writes the flags and every field whose presence flag is set, in wire
/// order. The instantaneous power field carries the distributed power;
/// `total_instantaneous_power` is derived on decode and not encoded.
///
/// # Examples
///
/// ```no_run
/// use gatt_measure::gatt::encoder::encode_cycling_power;
/// use gatt_measure::gatt::protocol::CyclingPowerMeasurement;
///
/// let measurement = CyclingPowerMeasurement {
///     distributed_instantaneous_power: 300,
///     total_instantaneous_power: 300,
///     ..Default::default()
/// };
/// assert_eq!(&encode_cycling_power(&measurement)[..], &[0x00, 0x00, 0x2C, 0x01]);
/// ```
pub fn encode_cycling_power(m: &CyclingPowerMeasurement) -> Bytes {
    let flags = m.flags;
    let mut buf = BytesMut::with_capacity(flags.payload_len());

    buf.put_u16_le(flags.bits());
    buf.put_i16_le(m.distributed_instantaneous_power);

    if flags.pedal_power_balance_present {
        buf.put_u8((m.pedal_power_balance * CPM_PEDAL_POWER_BALANCE_SCALE) as u8);
    }

    if flags.accumulated_torque_present {
        buf.put_u16_le((m.accumulated_torque * CPM_ACCUMULATED_TORQUE_SCALE) as u16);
    }

    if flags.wheel_revolution_data_present {
        buf.put_u32_le(m.cumulative_wheel_revolutions);
        buf.put_u16_le(m.last_wheel_event_time);
    }

    if flags.crank_revolution_data_present {
        buf.put_u16_le(m.cumulative_crank_revolutions);
        buf.put_u16_le(m.last_crank_event_time);
    }

    if flags.extreme_force_magnitudes_present {
        buf.put_i16_le(m.max_force_magnitude);
        buf.put_i16_le(m.min_force_magnitude);
    }

    if flags.extreme_torque_magnitudes_present {
        buf.put_i16_le(m.max_torque_magnitude);
        buf.put_i16_le(m.min_torque_magnitude);
    }

    if flags.extreme_angles_present {
        let (packed, trailing) = pack_extreme_angles(m.max_angle, m.min_angle);
        buf.put_u16_le(packed);
        buf.put_u8(trailing);
    }

    if flags.top_dead_spot_angle_present {
        buf.put_u16_le(m.top_dead_spot_angle);
    }

    if flags.bottom_dead_spot_angle_present {
        buf.put_u16_le(m.bottom_dead_spot_angle);
    }

    if flags.accumulated_energy_present {
        buf.put_u16_le(m.accumulated_energy);
    }

    buf.freeze()
}

/// Pack two 12-bit angles into the extreme angles field
///
/// Inverse of [`unpack_extreme_angles`](super::decoder::unpack_extreme_angles).
/// Bits above the low 12 of either angle are dropped.
pub fn pack_extreme_angles(max_angle: u16, min_angle: u16) -> (u16, u8) {
    let packed = ((max_angle & 0x0FFF) << 4) | ((min_angle >> 8) & 0x000F);
    let trailing = (min_angle & 0x00FF) as u8;
    (packed, trailing)
}

/// Encode a Running Speed and Cadence Measurement into its characteristic value
///
/// Total distance is written in decimetres (`metres * 10`), so distances that
/// were truncated on decode come back whole.
pub fn encode_running_speed_cadence(m: &RunningSpeedCadenceMeasurement) -> Bytes {
    let flags = m.flags;
    let mut buf = BytesMut::with_capacity(flags.payload_len());

    buf.put_u8(flags.bits());
    buf.put_u16_le((m.instantaneous_speed * RSC_SPEED_SCALE) as u16);
    buf.put_u8(m.instantaneous_cadence);

    if flags.instantaneous_stride_length_present {
        buf.put_u16_le(m.instantaneous_stride_length);
    }

    if flags.total_distance_present {
        buf.put_u32_le(m.total_distance.saturating_mul(RSC_DISTANCE_SCALE));
    }

    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::decoder::{
        decode_cycling_power, decode_running_speed_cadence, unpack_extreme_angles,
    };

    fn full_cycling_measurement(bits: u16) -> CyclingPowerMeasurement {
        let flags = CyclingPowerFlags::from_bits(bits);
        let mut m = CyclingPowerMeasurement {
            flags,
            distributed_instantaneous_power: 180,
            total_instantaneous_power: 180,
            ..Default::default()
        };

        if flags.pedal_power_balance_present {
            m.pedal_power_balance = 48.5;
            m.total_instantaneous_power = 371; // 18000 / 48.5 = 371.13
        }
        if flags.accumulated_torque_present {
            m.accumulated_torque = 1023.96875;
        }
        if flags.wheel_revolution_data_present {
            m.cumulative_wheel_revolutions = 3_000_000_000;
            m.last_wheel_event_time = 60000;
        }
        if flags.crank_revolution_data_present {
            m.cumulative_crank_revolutions = 4321;
            m.last_crank_event_time = 777;
        }
        if flags.extreme_force_magnitudes_present {
            m.max_force_magnitude = 1200;
            m.min_force_magnitude = -300;
        }
        if flags.extreme_torque_magnitudes_present {
            m.max_torque_magnitude = 80;
            m.min_torque_magnitude = -12;
        }
        if flags.extreme_angles_present {
            m.max_angle = 4000;
            m.min_angle = 181;
        }
        if flags.top_dead_spot_angle_present {
            m.top_dead_spot_angle = 12;
        }
        if flags.bottom_dead_spot_angle_present {
            m.bottom_dead_spot_angle = 190;
        }
        if flags.accumulated_energy_present {
            m.accumulated_energy = 65000;
        }
        m
    }

    #[test]
    fn test_encode_cycling_power_minimal() {
        let m = CyclingPowerMeasurement {
            distributed_instantaneous_power: 300,
            total_instantaneous_power: 300,
            ..Default::default()
        };
        assert_eq!(&encode_cycling_power(&m)[..], &[0x00, 0x00, 0x2C, 0x01]);
    }

    #[test]
    fn test_encode_cycling_power_layout() {
        let m = CyclingPowerMeasurement {
            flags: CyclingPowerFlags::from_bits(
                CPM_FLAG_PEDAL_POWER_BALANCE_PRESENT | CPM_FLAG_EXTREME_ANGLES_PRESENT,
            ),
            distributed_instantaneous_power: 150,
            total_instantaneous_power: 300,
            pedal_power_balance: 50.0,
            max_angle: 256,
            min_angle: 10,
            ..Default::default()
        };

        assert_eq!(
            &encode_cycling_power(&m)[..],
            &[0x01, 0x01, 0x96, 0x00, 100, 0x00, 0x10, 0x0A]
        );
    }

    #[test]
    fn test_pack_extreme_angles_inverts_unpack() {
        assert_eq!(pack_extreme_angles(256, 10), (4096, 10));
        assert_eq!(pack_extreme_angles(0x123, 0x456), (0x1234, 0x56));
        for (max, min) in [(0, 0), (4095, 4095), (1, 4094), (2048, 255)] {
            let (packed, trailing) = pack_extreme_angles(max, min);
            assert_eq!(unpack_extreme_angles(packed, trailing), (max, min));
        }
    }

    #[test]
    fn test_cycling_roundtrip_all_flag_combinations() {
        for bits in 0..=0x1FFFu16 {
            let m = full_cycling_measurement(bits);
            let encoded = encode_cycling_power(&m);

            assert_eq!(encoded.len(), m.flags.payload_len(), "flags {:#06x}", bits);
            assert_eq!(decode_cycling_power(&encoded).unwrap(), m, "flags {:#06x}", bits);
        }
    }

    #[test]
    fn test_encode_running_speed_cadence() {
        let m = RunningSpeedCadenceMeasurement {
            flags: RunningSpeedCadenceFlags::from_bits(
                RSC_FLAG_STRIDE_LENGTH_PRESENT | RSC_FLAG_TOTAL_DISTANCE_PRESENT,
            ),
            instantaneous_speed: 2.0,
            instantaneous_cadence: 90,
            instantaneous_stride_length: 16,
            total_distance: 10,
        };

        assert_eq!(
            &encode_running_speed_cadence(&m)[..],
            &[0x03, 0x00, 0x02, 0x5A, 0x10, 0x00, 0x64, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_running_roundtrip_all_flag_combinations() {
        for bits in 0..=0x07u8 {
            let flags = RunningSpeedCadenceFlags::from_bits(bits);
            let m = RunningSpeedCadenceMeasurement {
                flags,
                instantaneous_speed: 4.25,
                instantaneous_cadence: 182,
                instantaneous_stride_length: if flags.instantaneous_stride_length_present {
                    135
                } else {
                    0
                },
                total_distance: if flags.total_distance_present { 42_195 } else { 0 },
            };

            let encoded = encode_running_speed_cadence(&m);
            assert_eq!(encoded.len(), flags.payload_len());
            assert_eq!(decode_running_speed_cadence(&encoded).unwrap(), m);
        }
    }
}

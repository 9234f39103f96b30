//! # GATT Measurement Decoder
//!
//! Decodes Cycling Power Measurement and Running Speed and Cadence Measurement
//! characteristic values.
//!
//! Both layouts start with a flags field whose bits select the optional fields
//! that follow. Fields are read in a fixed order, and a payload too short for
//! the fields its flags declare fails as a whole with
//! [`GattError::OutOfRange`](crate::error::GattError::OutOfRange).

use tracing::trace;

use super::cursor::ByteCursor;
use super::protocol::*;
use crate::error::Result;

/// Decode a Cycling Power Measurement value
///
/// # Arguments
///
/// * `payload` - Characteristic value (at least 4 bytes)
///
/// # Returns
///
/// * `Result<CyclingPowerMeasurement>` - Decoded measurement
///
/// # Errors
///
/// Returns `OutOfRange` if the payload ends before a field its flags declare
pub fn decode_cycling_power(payload: &[u8]) -> Result<CyclingPowerMeasurement> {
    let mut cursor = ByteCursor::new(payload);
    let measurement = read_cycling_power(&mut cursor)?;

    trace!(
        flags = measurement.flags.bits(),
        consumed = cursor.position(),
        len = payload.len(),
        "Decoded cycling power measurement"
    );

    Ok(measurement)
}

/// Read a Cycling Power Measurement from the cursor's current position
///
/// Consumes exactly the bytes the flags declare; trailing bytes are left unread.
pub fn read_cycling_power(cursor: &mut ByteCursor<'_>) -> Result<CyclingPowerMeasurement> {
    // Flags byte 1 holds bits 0-7, byte 2 bits 8-12
    let flags = CyclingPowerFlags::from_bits(cursor.read_u16_le()?);

    let mut m = CyclingPowerMeasurement {
        flags,
        ..Default::default()
    };

    m.distributed_instantaneous_power = cursor.read_i16_le()?;
    m.total_instantaneous_power = m.distributed_instantaneous_power as i32;

    if flags.pedal_power_balance_present {
        m.pedal_power_balance = cursor.read_u8()? as f32 / CPM_PEDAL_POWER_BALANCE_SCALE;
        m.total_instantaneous_power =
            total_power_from_balance(m.distributed_instantaneous_power, m.pedal_power_balance);
    }

    if flags.accumulated_torque_present {
        m.accumulated_torque = cursor.read_u16_le()? as f32 / CPM_ACCUMULATED_TORQUE_SCALE;
    }

    if flags.wheel_revolution_data_present {
        m.cumulative_wheel_revolutions = cursor.read_u32_le()?;
        m.last_wheel_event_time = cursor.read_u16_le()?;
    }

    if flags.crank_revolution_data_present {
        m.cumulative_crank_revolutions = cursor.read_u16_le()?;
        m.last_crank_event_time = cursor.read_u16_le()?;
    }

    if flags.extreme_force_magnitudes_present {
        m.max_force_magnitude = cursor.read_i16_le()?;
        m.min_force_magnitude = cursor.read_i16_le()?;
    }

    if flags.extreme_torque_magnitudes_present {
        m.max_torque_magnitude = cursor.read_i16_le()?;
        m.min_torque_magnitude = cursor.read_i16_le()?;
    }

    if flags.extreme_angles_present {
        let packed = cursor.read_u16_le()?;
        let trailing = cursor.read_u8()?;
        (m.max_angle, m.min_angle) = unpack_extreme_angles(packed, trailing);
    }

    if flags.top_dead_spot_angle_present {
        m.top_dead_spot_angle = cursor.read_u16_le()?;
    }

    if flags.bottom_dead_spot_angle_present {
        m.bottom_dead_spot_angle = cursor.read_u16_le()?;
    }

    if flags.accumulated_energy_present {
        m.accumulated_energy = cursor.read_u16_le()?;
    }

    Ok(m)
}

/// Total power from one pedal's power and the pedal power balance
///
/// `distributed * 100 / balance`, truncated toward zero. A zero balance
/// saturates to `i32::MAX`/`i32::MIN` by sign, or 0 when the power is also 0.
pub fn total_power_from_balance(distributed: i16, balance: f32) -> i32 {
    ((distributed as i32 * 100) as f32 / balance) as i32
}

/// Split the extreme angles field into `(max_angle, min_angle)`
///
/// The two 12-bit angles span a `u16` and one trailing byte:
/// `max = packed / 16`, `min = (packed % 16) * 256 + trailing`.
pub fn unpack_extreme_angles(packed: u16, trailing: u8) -> (u16, u16) {
    let max_angle = packed / 16;
    let min_angle = (packed % 16) * 256 + trailing as u16;
    (max_angle, min_angle)
}

/// Cadence between two Cycling Power samples
///
/// Computes `Δ crank revolutions / (Δ crank event time / 1024.0)`, truncated.
/// Both deltas are taken modulo 2^16, so a counter passing
/// [`MAX_CUMULATIVE_CRANK_REVS`] between the two samples still yields the
/// elapsed count.
///
/// Returns [`CADENCE_UNAVAILABLE`] if either sample lacks crank revolution
/// data, or if no crank event time elapsed between them.
pub fn cadence(current: &CyclingPowerMeasurement, previous: &CyclingPowerMeasurement) -> i32 {
    if !has_crank_data(current, previous) {
        return CADENCE_UNAVAILABLE;
    }

    let revolutions = current
        .cumulative_crank_revolutions
        .wrapping_sub(previous.cumulative_crank_revolutions);
    let ticks = current
        .last_crank_event_time
        .wrapping_sub(previous.last_crank_event_time);

    cadence_from_deltas(revolutions as i32, ticks as i32)
}

/// Cadence between two Cycling Power samples without rollover correction
///
/// Same formula as [`cadence`] but with plain signed differences of the 16-bit
/// counters: a rollover between the samples produces a negative or wildly
/// wrong value.
pub fn cadence_unwrapped(
    current: &CyclingPowerMeasurement,
    previous: &CyclingPowerMeasurement,
) -> i32 {
    if !has_crank_data(current, previous) {
        return CADENCE_UNAVAILABLE;
    }

    let revolutions =
        current.cumulative_crank_revolutions as i32 - previous.cumulative_crank_revolutions as i32;
    let ticks = current.last_crank_event_time as i32 - previous.last_crank_event_time as i32;

    cadence_from_deltas(revolutions, ticks)
}

fn has_crank_data(current: &CyclingPowerMeasurement, previous: &CyclingPowerMeasurement) -> bool {
    current.flags.crank_revolution_data_present && previous.flags.crank_revolution_data_present
}

fn cadence_from_deltas(revolutions: i32, ticks: i32) -> i32 {
    if ticks == 0 {
        return CADENCE_UNAVAILABLE;
    }

    (revolutions as f32 / (ticks as f32 / CPM_CRANK_EVENT_TIME_RESOLUTION as f32)) as i32
}

/// Decode a Running Speed and Cadence Measurement value
///
/// # Arguments
///
/// * `payload` - Characteristic value (at least 4 bytes)
///
/// # Returns
///
/// * `Result<RunningSpeedCadenceMeasurement>` - Decoded measurement
///
/// # Errors
///
/// Returns `OutOfRange` if the payload ends before a field its flags declare
pub fn decode_running_speed_cadence(payload: &[u8]) -> Result<RunningSpeedCadenceMeasurement> {
    let mut cursor = ByteCursor::new(payload);
    let measurement = read_running_speed_cadence(&mut cursor)?;

    trace!(
        flags = measurement.flags.bits(),
        consumed = cursor.position(),
        len = payload.len(),
        "Decoded running speed and cadence measurement"
    );

    Ok(measurement)
}

/// Read a Running Speed and Cadence Measurement from the cursor's current position
pub fn read_running_speed_cadence(
    cursor: &mut ByteCursor<'_>,
) -> Result<RunningSpeedCadenceMeasurement> {
    let flags = RunningSpeedCadenceFlags::from_bits(cursor.read_u8()?);

    let mut m = RunningSpeedCadenceMeasurement {
        flags,
        ..Default::default()
    };

    m.instantaneous_speed = cursor.read_u16_le()? as f32 / RSC_SPEED_SCALE;
    m.instantaneous_cadence = cursor.read_u8()?;

    if flags.instantaneous_stride_length_present {
        m.instantaneous_stride_length = cursor.read_u16_le()?;
    }

    if flags.total_distance_present {
        m.total_distance = cursor.read_u32_le()? / RSC_DISTANCE_SCALE;
    }

    Ok(m)
}

//! Fixed-width datagram layouts exchanged with the simulator.
//!
//! Both records are little-endian and follow the C alignment of the simulator's
//! structs: the `u64` timer forces 8-byte alignment, and the one-byte `bit` flag in
//! the command is followed by three bytes of padding.

use thiserror::Error;

use crate::{
    CommandCode, CommandFrame, TelemetryFrame, COMMAND_LEN, RESERVED_CHANNELS, TELEMETRY_FLOAT_CHANNELS,
    TELEMETRY_LEN,
};

const FLOATS_OFFSET: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("telemetry datagram has {actual} bytes (expected {expected})")]
    TelemetryLength { expected: usize, actual: usize },
    #[error("command datagram has {actual} bytes (expected {expected})")]
    CommandLength { expected: usize, actual: usize },
}

/// Decode one telemetry record. Anything but exactly `TELEMETRY_LEN` bytes is rejected.
pub fn decode_telemetry(bytes: &[u8]) -> Result<TelemetryFrame, WireError> {
    if bytes.len() != TELEMETRY_LEN {
        return Err(WireError::TelemetryLength {
            expected: TELEMETRY_LEN,
            actual: bytes.len(),
        });
    }

    let mut ch = [0.0f32; TELEMETRY_FLOAT_CHANNELS];
    for (i, c) in ch.iter_mut().enumerate() {
        *c = read_f32_le(bytes, FLOATS_OFFSET + i * 4);
    }

    let mut reserved = [0.0f32; RESERVED_CHANNELS];
    reserved.copy_from_slice(&ch[TELEMETRY_FLOAT_CHANNELS - RESERVED_CHANNELS..]);

    Ok(TelemetryFrame {
        timer: read_u64_le(bytes, 0),
        number: read_i32_le(bytes, 8),
        fps: read_f32_le(bytes, 12),
        status: read_i32_le(bytes, 16),
        x: ch[0],
        y: ch[1],
        z: ch[2],
        bearing: ch[3],
        pitch: ch[4],
        roll: ch[5],
        speed: ch[6],
        health: ch[7],
        power: ch[8],
        turret_bearing: ch[9],
        turret_declination: ch[10],
        thrust: ch[11],
        steering: ch[12],
        reserved,
    })
}

/// Encode a telemetry record. The controller never sends these; simulators and tests do.
pub fn encode_telemetry(frame: &TelemetryFrame) -> [u8; TELEMETRY_LEN] {
    let mut buf = [0u8; TELEMETRY_LEN];
    buf[0..8].copy_from_slice(&frame.timer.to_le_bytes());
    buf[8..12].copy_from_slice(&frame.number.to_le_bytes());
    buf[12..16].copy_from_slice(&frame.fps.to_le_bytes());
    buf[16..20].copy_from_slice(&frame.status.to_le_bytes());

    let channels = [
        frame.x,
        frame.y,
        frame.z,
        frame.bearing,
        frame.pitch,
        frame.roll,
        frame.speed,
        frame.health,
        frame.power,
        frame.turret_bearing,
        frame.turret_declination,
        frame.thrust,
        frame.steering,
        frame.reserved[0],
        frame.reserved[1],
        frame.reserved[2],
    ];
    for (i, v) in channels.iter().enumerate() {
        let at = FLOATS_OFFSET + i * 4;
        buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }
    buf
}

pub fn encode_command(frame: &CommandFrame) -> [u8; COMMAND_LEN] {
    let mut buf = [0u8; COMMAND_LEN];
    buf[0..4].copy_from_slice(&frame.controlling_id.to_le_bytes());
    buf[4..8].copy_from_slice(&frame.thrust.to_le_bytes());
    buf[8..12].copy_from_slice(&frame.steering.to_le_bytes());
    buf[12..16].copy_from_slice(&frame.turret_declination.to_le_bytes());
    buf[16..20].copy_from_slice(&frame.yaw.to_le_bytes());
    buf[20..24].copy_from_slice(&frame.turret_bearing.to_le_bytes());
    buf[24..28].copy_from_slice(&frame.bank.to_le_bytes());
    buf[28..32].copy_from_slice(&frame.faction.to_le_bytes());
    buf[32..40].copy_from_slice(&frame.timer.to_le_bytes());
    buf[40..44].copy_from_slice(&frame.code.to_raw().to_le_bytes());
    buf[44..48].copy_from_slice(&frame.spawn_id.to_le_bytes());
    buf[48..52].copy_from_slice(&frame.island_type.to_le_bytes());
    buf[52..56].copy_from_slice(&frame.target_x.to_le_bytes());
    buf[56..60].copy_from_slice(&frame.target_y.to_le_bytes());
    buf[60..64].copy_from_slice(&frame.target_z.to_le_bytes());
    buf[64..68].copy_from_slice(&frame.target.to_le_bytes());
    buf[68] = frame.bit as u8;
    // 69..72: padding
    buf[72..76].copy_from_slice(&frame.weapon.to_le_bytes());
    buf
}

pub fn decode_command(bytes: &[u8]) -> Result<CommandFrame, WireError> {
    if bytes.len() != COMMAND_LEN {
        return Err(WireError::CommandLength {
            expected: COMMAND_LEN,
            actual: bytes.len(),
        });
    }
    Ok(CommandFrame {
        controlling_id: read_i32_le(bytes, 0),
        thrust: read_f32_le(bytes, 4),
        steering: read_f32_le(bytes, 8),
        turret_declination: read_f32_le(bytes, 12),
        yaw: read_f32_le(bytes, 16),
        turret_bearing: read_f32_le(bytes, 20),
        bank: read_f32_le(bytes, 24),
        faction: read_i32_le(bytes, 28),
        timer: read_u64_le(bytes, 32),
        code: CommandCode::from_raw(read_i32_le(bytes, 40)),
        spawn_id: read_i32_le(bytes, 44),
        island_type: read_i32_le(bytes, 48),
        target_x: read_f32_le(bytes, 52),
        target_y: read_f32_le(bytes, 56),
        target_z: read_f32_le(bytes, 60),
        target: read_i32_le(bytes, 64),
        bit: bytes[68] != 0,
        weapon: read_i32_le(bytes, 72),
    })
}

#[inline]
fn read_u64_le(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}

#[inline]
fn read_i32_le(bytes: &[u8], at: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(raw)
}

#[inline]
fn read_f32_le(bytes: &[u8], at: usize) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    f32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;

    #[test]
    fn test_short_telemetry_rejected() {
        let err = decode_telemetry(&[0u8; 80]).unwrap_err();
        assert_eq!(
            err,
            WireError::TelemetryLength {
                expected: 84,
                actual: 80
            }
        );
        assert!(decode_telemetry(&[0u8; 85]).is_err());
        assert!(decode_telemetry(&[]).is_err());
    }

    #[test]
    fn test_telemetry_field_offsets() {
        let mut buf = [0u8; TELEMETRY_LEN];
        buf[0..8].copy_from_slice(&4321u64.to_le_bytes());
        buf[8..12].copy_from_slice(&2i32.to_le_bytes());
        // x, z, bearing, health, power
        buf[20..24].copy_from_slice(&150.5f32.to_le_bytes());
        buf[28..32].copy_from_slice(&(-75.0f32).to_le_bytes());
        buf[32..36].copy_from_slice(&270.0f32.to_le_bytes());
        buf[48..52].copy_from_slice(&880.0f32.to_le_bytes());
        buf[52..56].copy_from_slice(&640.0f32.to_le_bytes());

        let f = decode_telemetry(&buf).unwrap();
        assert_eq!(f.timer, 4321);
        assert_eq!(f.number, 2);
        assert_eq!(f.x, 150.5);
        assert_eq!(f.z, -75.0);
        assert_eq!(f.bearing, 270.0);
        assert_eq!(f.health, 880.0);
        assert_eq!(f.power, 640.0);
    }

    #[test]
    fn test_telemetry_encode_matches_decode() {
        let mut frame = TelemetryFrame::at(1, -320.0, 45.5, 12.0);
        frame.timer = 99;
        frame.reserved = [1.0, 2.0, 3.0];
        let bytes = encode_telemetry(&frame);
        assert_eq!(decode_telemetry(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_command_layout() {
        let cmd = Command {
            thrust: 10.0,
            steering: -15.0,
            turret_declination: 0.5,
            turret_bearing: 181.0,
            fire: true,
        };
        let frame = CommandFrame::new(1, 1234, &cmd, CommandCode::Fire);
        let buf = encode_command(&frame);

        assert_eq!(buf.len(), 76);
        assert_eq!(&buf[0..4], &1i32.to_le_bytes());
        assert_eq!(&buf[4..8], &10.0f32.to_le_bytes());
        assert_eq!(&buf[20..24], &181.0f32.to_le_bytes());
        assert_eq!(&buf[28..32], &1i32.to_le_bytes());
        assert_eq!(&buf[32..40], &1234u64.to_le_bytes());
        assert_eq!(&buf[40..44], &11i32.to_le_bytes());
        assert_eq!(&buf[69..72], &[0, 0, 0]);

        let back = decode_command(&buf).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_short_command_rejected() {
        assert!(matches!(
            decode_command(&[0u8; 75]),
            Err(WireError::CommandLength { actual: 75, .. })
        ));
    }
}

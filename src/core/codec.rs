//! Stellarium binary frames and their raw angle scaling.
//!
//! Goto frame (client → server), 20 bytes little-endian:
//! `u16 size, u16 type, u64 timestamp, u32 ra_raw, i32 dec_raw`.
//!
//! Position frame (server → client), 24 bytes little-endian:
//! `u16 24, u16 0, u64 timestamp_micros, u32 ra_raw, i32 dec_raw, i32 status`.

use crate::domain::model::{AnglePosition, AstronomicalPosition};

pub const GOTO_FRAME_LEN: usize = 20;
pub const POSITION_FRAME_LEN: usize = 24;

/// 2^31，RA 12h / DEC 180° 對應的整數刻度
const FULL_SCALE: f64 = 2_147_483_648.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GotoFrame {
    pub right_ascension: AstronomicalPosition,
    pub declination: AnglePosition,
}

impl GotoFrame {
    /// Size and type fields are ignored, the frame length is fixed.
    pub fn decode(frame: &[u8; GOTO_FRAME_LEN]) -> Self {
        let mut ra_raw = [0u8; 4];
        ra_raw.copy_from_slice(&frame[12..16]);
        let mut dec_raw = [0u8; 4];
        dec_raw.copy_from_slice(&frame[16..20]);

        let ra_hours = u32::from_le_bytes(ra_raw) as f64 * 12.0 / FULL_SCALE;
        let dec_degrees = i32::from_le_bytes(dec_raw) as f64 * 180.0 / FULL_SCALE;

        Self {
            right_ascension: AstronomicalPosition::from_decimal(ra_hours),
            declination: AnglePosition::from_decimal(dec_degrees),
        }
    }
}

pub fn encode_goto_frame(ra_raw: u32, dec_raw: i32) -> [u8; GOTO_FRAME_LEN] {
    let mut frame = [0u8; GOTO_FRAME_LEN];
    frame[0..2].copy_from_slice(&(GOTO_FRAME_LEN as u16).to_le_bytes());
    frame[12..16].copy_from_slice(&ra_raw.to_le_bytes());
    frame[16..20].copy_from_slice(&dec_raw.to_le_bytes());
    frame
}

pub fn ra_to_raw(ra_hours: f64) -> u32 {
    // rem_euclid 可能回傳剛好 24.0，經 u64 截斷後回到 0
    ((ra_hours.rem_euclid(24.0) / 12.0 * FULL_SCALE) as u64) as u32
}

pub fn dec_to_raw(dec_degrees: f64) -> i32 {
    (dec_degrees / 180.0 * FULL_SCALE) as i32
}

pub fn encode_position_frame(
    ra: &AstronomicalPosition,
    dec: &AnglePosition,
    timestamp_micros: u64,
) -> [u8; POSITION_FRAME_LEN] {
    let mut frame = [0u8; POSITION_FRAME_LEN];
    frame[0..2].copy_from_slice(&(POSITION_FRAME_LEN as u16).to_le_bytes());
    frame[2..4].copy_from_slice(&0u16.to_le_bytes());
    frame[4..12].copy_from_slice(&timestamp_micros.to_le_bytes());
    frame[12..16].copy_from_slice(&ra_to_raw(ra.to_decimal()).to_le_bytes());
    frame[16..20].copy_from_slice(&dec_to_raw(dec.to_decimal()).to_le_bytes());
    frame[20..24].copy_from_slice(&0i32.to_le_bytes());
    frame
}

pub fn now_micros() -> u64 {
    chrono::Utc::now().timestamp_micros().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_decode_quarter_scale() {
        let frame = encode_goto_frame(0x4000_0000, 0x4000_0000);
        let decoded = GotoFrame::decode(&frame);
        assert!((decoded.right_ascension.to_decimal() - 6.0).abs() < EPSILON);
        assert!((decoded.declination.to_decimal() - 90.0).abs() < EPSILON);
        assert_eq!(decoded.right_ascension.hours, 6.0);
        assert_eq!(decoded.declination.degrees, 90.0);
    }

    #[test]
    fn test_decode_negative_declination() {
        let frame = encode_goto_frame(0, -0x2000_0000);
        let decoded = GotoFrame::decode(&frame);
        assert!((decoded.declination.to_decimal() + 45.0).abs() < EPSILON);
        assert_eq!(decoded.declination.degrees, -45.0);
    }

    #[test]
    fn test_encode_position_frame_layout() {
        let ra = AstronomicalPosition::from_decimal(6.0);
        let dec = AnglePosition::from_decimal(-90.0);
        let frame = encode_position_frame(&ra, &dec, 1_234_567);

        assert_eq!(u16::from_le_bytes([frame[0], frame[1]]), 24);
        assert_eq!(u16::from_le_bytes([frame[2], frame[3]]), 0);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&frame[4..12]);
        assert_eq!(u64::from_le_bytes(ts), 1_234_567);
        assert_eq!(
            u32::from_le_bytes([frame[12], frame[13], frame[14], frame[15]]),
            0x4000_0000
        );
        assert_eq!(
            i32::from_le_bytes([frame[16], frame[17], frame[18], frame[19]]),
            -0x4000_0000
        );
        assert_eq!(&frame[16..20], &[0x00, 0x00, 0x00, 0xC0]);
        assert_eq!(&frame[20..24], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_ra_wraps_before_scaling() {
        assert_eq!(ra_to_raw(30.0), ra_to_raw(6.0));
        assert_eq!(ra_to_raw(-18.0), ra_to_raw(6.0));
        assert_eq!(ra_to_raw(24.0), 0);
    }

    #[test]
    fn test_dec_is_not_wrapped() {
        assert_eq!(dec_to_raw(90.0), 0x4000_0000);
        assert_eq!(dec_to_raw(-45.0), -0x2000_0000);
    }
}

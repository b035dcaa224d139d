use serde::{Deserialize, Serialize};
use std::fmt;

/// Splits a decimal angle (degrees or hours) into whole/minutes/seconds.
///
/// The sign of `value` is applied to all three components, so `-10.5`
/// becomes `(-10, -30, -0)`.
pub fn decimal_to_dms(value: f64) -> (f64, f64, f64) {
    let sign = if value < 0.0 { -1.0 } else { 1.0 };
    let magnitude = value.abs();

    let whole = magnitude.floor();
    let minutes_float = (magnitude - whole) * 60.0;
    let minutes = minutes_float.floor();
    let seconds = (minutes_float - minutes) * 60.0;

    (whole * sign, minutes * sign, seconds * sign)
}

pub fn dms_to_decimal(whole: f64, minutes: f64, seconds: f64) -> f64 {
    whole + minutes / 60.0 + seconds / 3600.0
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnglePosition {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl AnglePosition {
    pub fn new(degrees: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            degrees,
            minutes,
            seconds,
        }
    }

    pub fn to_decimal(&self) -> f64 {
        dms_to_decimal(self.degrees, self.minutes, self.seconds)
    }

    pub fn from_decimal(angle: f64) -> Self {
        let (degrees, minutes, seconds) = decimal_to_dms(angle);
        Self::new(degrees, minutes, seconds)
    }
}

impl fmt::Display for AnglePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}° {}' {:.2}\"", self.degrees, self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AstronomicalPosition {
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl AstronomicalPosition {
    pub fn new(hours: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            longitude: None,
        }
    }

    pub fn to_decimal(&self) -> f64 {
        dms_to_decimal(self.hours, self.minutes, self.seconds)
    }

    pub fn from_decimal(hours: f64) -> Self {
        let (hours, minutes, seconds) = decimal_to_dms(hours);
        Self::new(hours, minutes, seconds)
    }
}

impl fmt::Display for AstronomicalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m {:.2}s", self.hours, self.minutes, self.seconds)
    }
}

/// Named speed tier used for continuous slewing (`:RS#`, `:RM#`, `:RC#`, `:RG#`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlewRate {
    #[default]
    Max,
    Finding,
    Centering,
    Guiding,
}

impl SlewRate {
    /// run_speed 偏移量；未填的欄位為 None
    pub fn offset(&self) -> SlewOffset {
        match self {
            SlewRate::Max => SlewOffset {
                degrees: Some(2),
                ..SlewOffset::default()
            },
            SlewRate::Finding => SlewOffset {
                minutes: Some(30),
                ..SlewOffset::default()
            },
            SlewRate::Centering => SlewOffset {
                seconds: Some(30),
                ..SlewOffset::default()
            },
            SlewRate::Guiding => SlewOffset {
                seconds: Some(1),
                ..SlewOffset::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlewOffset {
    pub degrees: Option<i32>,
    pub minutes: Option<i32>,
    pub seconds: Option<i32>,
}

impl SlewOffset {
    pub fn scaled(&self, direction: Direction) -> RunSpeed {
        let sign = direction.sign();
        RunSpeed {
            degrees: self.degrees.map_or(0, |v| v * sign),
            minutes: self.minutes.map_or(0, |v| v * sign),
            seconds: self.seconds.map_or(0, |v| v * sign),
        }
    }
}

/// Body of a `run_speed` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSpeed {
    pub degrees: i32,
    pub minutes: i32,
    pub seconds: i32,
}

impl RunSpeed {
    pub fn zero() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn sign(&self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    RightAscension,
    Declination,
}

impl Axis {
    /// Coordinate flavour the axis server expects for goto/sync on this axis.
    pub fn coordinate_kind(&self) -> &'static str {
        match self {
            Axis::RightAscension => "astronomical",
            Axis::Declination => "angle",
        }
    }

    pub fn current_path(&self) -> &'static str {
        match self {
            Axis::RightAscension => "mount.right_ascension",
            Axis::Declination => "mount.declination",
        }
    }

    pub fn target_path(&self) -> &'static str {
        match self {
            Axis::RightAscension => "mount.target.right_ascension",
            Axis::Declination => "mount.target.declination",
        }
    }
}

/// Axis server device ids, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisIds {
    pub ra: String,
    pub dec: String,
}

impl AxisIds {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
        }
    }

    pub fn id_for(&self, axis: Axis) -> &str {
        match axis {
            Axis::RightAscension => &self.ra,
            Axis::Declination => &self.dec,
        }
    }

    pub fn axis_for(&self, id: &str) -> Option<Axis> {
        if id == self.ra {
            Some(Axis::RightAscension)
        } else if id == self.dec {
            Some(Axis::Declination)
        } else {
            None
        }
    }
}

impl Default for AxisIds {
    fn default() -> Self {
        Self::new("RA", "DEC")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    #[default]
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_dms_round_trip_keeps_sign() {
        for value in [0.0, 1.5, -1.5, 23.999_999, -89.25, 12.345_678, -0.004] {
            let (whole, minutes, seconds) = decimal_to_dms(value);
            assert!((dms_to_decimal(whole, minutes, seconds) - value).abs() < EPSILON);
            if value < 0.0 {
                assert!(whole <= 0.0 && minutes <= 0.0 && seconds <= 0.0);
            }
        }
    }

    #[test]
    fn test_negative_sign_is_distributed() {
        let (whole, minutes, seconds) = decimal_to_dms(-10.5);
        assert_eq!(whole, -10.0);
        assert_eq!(minutes, -30.0);
        assert_eq!(seconds, 0.0);
        assert!(seconds.is_sign_negative());
    }

    #[test]
    fn test_guiding_offset_negative_direction() {
        let payload = SlewRate::Guiding.offset().scaled(Direction::Negative);
        assert_eq!(
            payload,
            RunSpeed {
                degrees: 0,
                minutes: 0,
                seconds: -1
            }
        );
    }

    #[test]
    fn test_slew_rate_offsets() {
        assert_eq!(SlewRate::Max.offset().scaled(Direction::Positive).degrees, 2);
        assert_eq!(SlewRate::Finding.offset().scaled(Direction::Negative).minutes, -30);
        assert_eq!(SlewRate::Centering.offset().scaled(Direction::Positive).seconds, 30);
    }

    #[test]
    fn test_axis_lookup_by_id() {
        let axes = AxisIds::new("A1", "A2");
        assert_eq!(axes.axis_for("A1"), Some(Axis::RightAscension));
        assert_eq!(axes.axis_for("A2"), Some(Axis::Declination));
        assert_eq!(axes.axis_for("A3"), None);
        assert_eq!(axes.id_for(Axis::Declination), "A2");
    }

    #[test]
    fn test_astronomical_dict_omits_missing_longitude() {
        let ra = AstronomicalPosition::new(6.0, 30.0, 0.0);
        let json = serde_json::to_value(ra).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hours": 6.0, "minutes": 30.0, "seconds": 0.0})
        );
    }

    #[test]
    fn test_partial_dict_deserializes_with_defaults() {
        let dec: AnglePosition = serde_json::from_value(serde_json::json!({"degrees": 45})).unwrap();
        assert_eq!(dec, AnglePosition::new(45.0, 0.0, 0.0));
    }
}

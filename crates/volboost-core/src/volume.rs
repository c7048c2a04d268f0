use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::VolumeError;

/// Output level in percent of nominal, always within `0..=600`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct VolumeLevel(u16);

impl VolumeLevel {
    pub const MIN_PERCENT: u16 = 0;
    pub const MAX_PERCENT: u16 = 600;
    pub const NOMINAL: Self = Self(100);

    pub fn new(percent: i64) -> Result<Self, VolumeError> {
        if (i64::from(Self::MIN_PERCENT)..=i64::from(Self::MAX_PERCENT)).contains(&percent) {
            Ok(Self(percent as u16))
        } else {
            Err(VolumeError::OutOfRange { value: percent })
        }
    }

    /// Parses an untrusted JSON value. Integral numbers and numeric strings are
    /// accepted; fractions, booleans, nulls and the like are not.
    pub fn from_json(value: &Value) -> Result<Self, VolumeError> {
        match value {
            Value::Number(number) => {
                if let Some(v) = number.as_i64() {
                    return Self::new(v);
                }
                match number.as_f64() {
                    Some(v) if v.is_finite() && v.fract() == 0.0 => Self::new(v as i64),
                    _ => Err(VolumeError::NonNumeric {
                        raw: number.to_string(),
                    }),
                }
            },
            Value::String(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| VolumeError::NonNumeric { raw: raw.clone() })
                .and_then(Self::new),
            other => Err(VolumeError::NonNumeric {
                raw: other.to_string(),
            }),
        }
    }

    pub const fn percent(self) -> u16 {
        self.0
    }

    /// Linear gain factor for the gain stage (`percent / 100`).
    pub fn gain(self) -> f32 {
        f32::from(self.0) / 100.0
    }

    pub fn is_nominal(self) -> bool {
        self == Self::NOMINAL
    }
}

impl Default for VolumeLevel {
    fn default() -> Self {
        Self::NOMINAL
    }
}

impl TryFrom<i64> for VolumeLevel {
    type Error = VolumeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VolumeLevel> for u16 {
    fn from(value: VolumeLevel) -> Self {
        value.0
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_bounds_and_rejects_outside() {
        assert_eq!(VolumeLevel::new(0).map(VolumeLevel::percent), Ok(0));
        assert_eq!(VolumeLevel::new(600).map(VolumeLevel::percent), Ok(600));
        assert_eq!(
            VolumeLevel::new(601),
            Err(VolumeError::OutOfRange { value: 601 })
        );
        assert_eq!(
            VolumeLevel::new(-1),
            Err(VolumeError::OutOfRange { value: -1 })
        );
    }

    #[test]
    fn parses_json_numbers_and_numeric_strings() {
        assert_eq!(VolumeLevel::from_json(&json!(250)).map(u16::from), Ok(250));
        assert_eq!(VolumeLevel::from_json(&json!(300.0)).map(u16::from), Ok(300));
        assert_eq!(VolumeLevel::from_json(&json!(" 120 ")).map(u16::from), Ok(120));
        assert!(VolumeLevel::from_json(&json!(12.5)).is_err());
        assert!(VolumeLevel::from_json(&json!("loud")).is_err());
        assert!(VolumeLevel::from_json(&json!(null)).is_err());
        assert!(VolumeLevel::from_json(&json!(true)).is_err());
        assert!(VolumeLevel::from_json(&json!(900)).is_err());
    }

    #[test]
    fn gain_is_percent_over_hundred() {
        let level = VolumeLevel::new(300).expect("valid level");
        assert!((level.gain() - 3.0).abs() < f32::EPSILON);
        assert!((VolumeLevel::NOMINAL.gain() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn serde_round_trips_through_integer() {
        let level: VolumeLevel = serde_json::from_value(json!(450)).expect("deserialize");
        assert_eq!(level.percent(), 450);
        assert_eq!(serde_json::to_value(level).expect("serialize"), json!(450));
        assert!(serde_json::from_value::<VolumeLevel>(json!(700)).is_err());
    }
}

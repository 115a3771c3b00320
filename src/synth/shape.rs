//! Waveform shapes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Waveform types an oscillator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Sine,
    /// Two-segment ramp shaped by skew
    Triangle,
    /// Pulse wave shaped by duty
    Rectangle,
    /// White noise (uniform random)
    Noise,
}

/// Returned when a shape identifier is not one of the known names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shape '{0}' (expected Sine, Triangle, Rectangle or Noise)")]
pub struct ParseShapeError(pub String);

impl Shape {
    /// All shapes, in selector order
    pub const ALL: [Shape; 4] = [Shape::Sine, Shape::Triangle, Shape::Rectangle, Shape::Noise];

    /// The identifier used by control surfaces and config files
    pub fn name(self) -> &'static str {
        match self {
            Shape::Sine => "Sine",
            Shape::Triangle => "Triangle",
            Shape::Rectangle => "Rectangle",
            Shape::Noise => "Noise",
        }
    }

    pub(crate) fn as_code(self) -> u8 {
        match self {
            Shape::Sine => 0,
            Shape::Triangle => 1,
            Shape::Rectangle => 2,
            Shape::Noise => 255,
        }
    }

    /// Unknown codes read back as Sine
    pub(crate) fn from_code(code: u8) -> Self {
        match code {
            1 => Shape::Triangle,
            2 => Shape::Rectangle,
            255 => Shape::Noise,
            _ => Shape::Sine,
        }
    }
}

impl FromStr for Shape {
    type Err = ParseShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name() == s)
            .ok_or_else(|| ParseShapeError(s.to_string()))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("Sine".parse::<Shape>(), Ok(Shape::Sine));
        assert_eq!("Triangle".parse::<Shape>(), Ok(Shape::Triangle));
        assert_eq!("Rectangle".parse::<Shape>(), Ok(Shape::Rectangle));
        assert_eq!("Noise".parse::<Shape>(), Ok(Shape::Noise));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("sine".parse::<Shape>().is_err());
        assert!("NOISE".parse::<Shape>().is_err());
        assert!("".parse::<Shape>().is_err());
    }

    #[test]
    fn test_unknown_code_reads_as_sine() {
        assert_eq!(Shape::from_code(3), Shape::Sine);
        assert_eq!(Shape::from_code(254), Shape::Sine);
        for shape in Shape::ALL {
            assert_eq!(Shape::from_code(shape.as_code()), shape);
        }
    }

    #[test]
    fn test_serde_uses_identifiers() {
        let shape: Shape = serde_yaml::from_str("Rectangle").unwrap();
        assert_eq!(shape, Shape::Rectangle);
        assert!(serde_yaml::from_str::<Shape>("rectangle").is_err());
    }
}

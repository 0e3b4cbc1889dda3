//! Confidence module

use serde::{Deserialize, Serialize};
use std::fmt;

/// A confidence score in [0.0, 1.0]
///
/// Used for thesis confidence and chain strength.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Create a new confidence score
    ///
    /// # Panics
    /// Panics if the value is outside [0, 1] or NaN
    pub fn new(value: f64) -> Self {
        assert!((0.0..=1.0).contains(&value), "Confidence must be in [0, 1]");
        Self(value)
    }

    /// Create a confidence score, rejecting out-of-range values
    pub fn try_new(value: f64) -> Result<Self, String> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("confidence {} out of range [0.0, 1.0]", value))
        }
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_creation() {
        let c = Confidence::new(0.7);
        assert_eq!(c.value(), 0.7);
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert!(Confidence::try_new(1.5).is_err());
        assert!(Confidence::try_new(-0.1).is_err());
        assert!(Confidence::try_new(f64::NAN).is_err());
        assert!(Confidence::try_new(0.0).is_ok());
        assert!(Confidence::try_new(1.0).is_ok());
    }

    #[test]
    fn test_ordering() {
        assert!(Confidence::new(0.9) > Confidence::new(0.7));
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Confidence>("2.0").is_err());
        let c: Confidence = serde_json::from_str("0.25").unwrap();
        assert_eq!(c.value(), 0.25);
    }

    #[test]
    #[should_panic]
    fn test_invalid_value_panics() {
        Confidence::new(1.1);
    }
}

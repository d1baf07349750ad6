use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number as JsonNumber;

use crate::CanonicalizeError;

/// Represents a JSON number using IEEE-754 double precision.
///
/// Integral values serialize without a fractional part, so `1` and `1.0`
/// compare equal and both encode as `1`.
#[derive(Clone, Copy, Debug, PartialOrd)]
pub struct Number(f64);

impl Number {
    /// Creates a new [`Number`] after validating finiteness.
    ///
    /// ```
    /// # use json_delta_core::Number;
    /// let num = Number::new(42.0)?;
    /// assert_eq!(num.get(), 42.0);
    /// assert!(Number::new(f64::NAN).is_err());
    /// # Ok::<(), json_delta_core::CanonicalizeError>(())
    /// ```
    pub fn new(value: f64) -> Result<Self, CanonicalizeError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(CanonicalizeError::NotFinite { value })
        }
    }

    /// Returns the raw floating-point value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }

    fn as_integer(self) -> Option<i64> {
        let value = self.0;
        if value.fract() == 0.0
            && !(value == 0.0 && value.is_sign_negative())
            && (i64::MIN as f64) <= value
            && value < (i64::MAX as f64)
        {
            Some(value as i64)
        } else {
            None
        }
    }

    /// Converts the number into a `serde_json::Number` using minimal integer
    /// representation when possible.
    ///
    /// ```
    /// # use json_delta_core::Number;
    /// assert_eq!(Number::new(5.0)?.to_json_number().to_string(), "5");
    /// assert_eq!(Number::new(0.5)?.to_json_number().to_string(), "0.5");
    /// # Ok::<(), json_delta_core::CanonicalizeError>(())
    /// ```
    #[must_use]
    pub fn to_json_number(self) -> JsonNumber {
        if let Some(int) = self.as_integer() {
            return JsonNumber::from(int);
        }
        // Finite by construction, so `from_f64` only fails for values that
        // bypassed `Number::new`.
        JsonNumber::from_f64(self.0).unwrap_or_else(|| JsonNumber::from(0))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_json_number(), f)
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_integer() {
            Some(int) => serializer.serialize_i64(int),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Number::new(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<f64> for Number {
    type Error = CanonicalizeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Self(f64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_values_serialize_without_fraction() {
        let num = Number::new(3.0).unwrap();
        assert_eq!(serde_json::to_string(&num).unwrap(), "3");
        assert_eq!(num.to_string(), "3");
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        let num = Number::new(-0.0).unwrap();
        assert_eq!(serde_json::to_string(&num).unwrap(), "-0.0");
    }

    #[test]
    fn integer_and_float_forms_are_equal() {
        let int: Number = serde_json::from_str("1").unwrap();
        let float: Number = serde_json::from_str("1.0").unwrap();
        assert_eq!(int, float);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            Number::new(f64::INFINITY),
            Err(CanonicalizeError::NotFinite { .. })
        ));
    }
}

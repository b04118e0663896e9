//! Product prices in minor currency units.
//!
//! The shop sells in Vietnamese dong, which has no subdivision in practice,
//! so one minor unit is one đồng.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative price in the smallest currency unit.
///
/// Serializes as a bare integer.
///
/// ```
/// use bazaar_core::Price;
///
/// let price = Price::new(250_000).unwrap();
/// assert_eq!(price.to_string(), "250.000 ₫");
/// assert!(Price::new(-1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(i64);

impl Price {
    /// Currency symbol used when formatting.
    pub const SYMBOL: &'static str = "₫";

    /// Create a price from an amount in minor units.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero.
    pub const fn new(minor_units: i64) -> Result<Self, PriceError> {
        if minor_units < 0 {
            return Err(PriceError::Negative);
        }
        Ok(Self(minor_units))
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    /// Formats with `.` thousands separators, Vietnamese style: `99.000 ₫`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{grouped} {}", Self::SYMBOL)
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::new(0).unwrap().to_string(), "0 ₫");
        assert_eq!(Price::new(999).unwrap().to_string(), "999 ₫");
        assert_eq!(Price::new(99_000).unwrap().to_string(), "99.000 ₫");
        assert_eq!(Price::new(1_250_000).unwrap().to_string(), "1.250.000 ₫");
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Price::new(-5), Err(PriceError::Negative));
        let parsed: Result<Price, _> = serde_json::from_str("-100");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Price::new(150_000).unwrap()).unwrap();
        assert_eq!(json, "150000");
    }
}

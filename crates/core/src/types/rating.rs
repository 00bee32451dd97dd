//! Review star rating.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A product rating between 1 and 5 stars inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;
    /// Rating used when the form does not supply one.
    pub const DEFAULT: Self = Self(Self::MAX);

    /// Clamp an arbitrary integer into the allowed range.
    ///
    /// ```
    /// use mars_shop_core::Rating;
    ///
    /// assert_eq!(Rating::clamped(0).value(), 1);
    /// assert_eq!(Rating::clamped(3).value(), 3);
    /// assert_eq!(Rating::clamped(99).value(), 5);
    /// ```
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        // In range 1..=5 after clamping.
        Self(u8::try_from(clamped).unwrap_or(Self::MAX))
    }

    /// Get the rating as a number of stars.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Value as stored in the `INTEGER` column.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        i32::from(self.0)
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_low_values() {
        assert_eq!(Rating::clamped(-10).value(), 1);
        assert_eq!(Rating::clamped(0).value(), 1);
    }

    #[test]
    fn test_clamps_high_values() {
        assert_eq!(Rating::clamped(6).value(), 5);
        assert_eq!(Rating::clamped(i64::MAX).value(), 5);
    }

    #[test]
    fn test_keeps_valid_values() {
        for stars in 1..=5 {
            assert_eq!(i64::from(Rating::clamped(stars).value()), stars);
        }
    }

    #[test]
    fn test_default_is_five_stars() {
        assert_eq!(Rating::default().value(), 5);
    }
}

//! Type-safe money amounts using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC` in the database and never pass through
//! floating point except when rendered as JSON numbers for the API.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A non-currency-tagged money amount in the shop's currency.
///
/// Serializes as a decimal string (e.g. `"12.50"`) so no precision is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units at this price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Lossy conversion for JSON number fields.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap())
    }

    #[test]
    fn test_times() {
        assert_eq!(price("19.99").times(3), price("59.97"));
        assert_eq!(price("5.00").times(0), Price::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Price = [price("1.10"), price("2.20"), price("3.30")]
            .into_iter()
            .sum();
        assert_eq!(total, price("6.60"));

        let empty: Price = std::iter::empty().sum();
        assert_eq!(empty, Price::ZERO);
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(price("12.5").to_string(), "12.50");
        assert_eq!(price("0").to_string(), "0.00");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&price("12.50")).unwrap();
        assert_eq!(json, "\"12.50\"");
    }

    #[test]
    fn test_to_f64() {
        assert!((price("12.25").to_f64() - 12.25).abs() < f64::EPSILON);
    }
}

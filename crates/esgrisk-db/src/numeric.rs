//! Conversions between scoring floats and `NUMERIC` columns.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::DbError;

/// Decimal places kept for article-level sentiment and confidence columns.
pub(crate) const SIGNAL_SCALE: u32 = 6;
/// Decimal places kept for aggregate sentiment, confidence, and trend columns.
pub(crate) const AGGREGATE_SCALE: u32 = 4;

pub(crate) fn to_decimal(field: &'static str, value: f64, scale: u32) -> Result<Decimal, DbError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(scale))
        .ok_or(DbError::NonFiniteValue { field })
}

/// Unrepresentable values come back as NaN so range validation rejects them.
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn to_decimal_rounds_to_scale() {
        let d = to_decimal("sentiment", 0.123_456_789, SIGNAL_SCALE).unwrap();
        assert_eq!(d, Decimal::from_str("0.123457").unwrap());
    }

    #[test]
    fn to_decimal_rejects_nan() {
        let err = to_decimal("sentiment", f64::NAN, SIGNAL_SCALE).unwrap_err();
        assert!(matches!(err, DbError::NonFiniteValue { field: "sentiment" }));
    }

    #[test]
    fn to_f64_round_trips_stored_values() {
        let d = Decimal::from_str("-0.4400").unwrap();
        assert!((to_f64(d) - -0.44).abs() < 1e-12);
    }
}

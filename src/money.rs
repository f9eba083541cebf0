//! Monetary arithmetic on `Decimal`.
//!
//! Every stored or emitted amount goes through [`round_money`], so ARS totals,
//! USD conversions and per-line subtotals all agree to the cent.

use rust_decimal::{Decimal, RoundingStrategy};

const DECIMAL_PLACES: u32 = 2;

/// Scale of a stored exchange rate (`NUMERIC(14, 4)`).
pub const RATE_DECIMAL_PLACES: u32 = 4;

/// Tolerance for comparing client-supplied amounts (0.01).
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round an exchange rate to the scale it is stored with.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an ARS amount to USD at `tipo_cambio` ARS per USD.
///
/// Returns `None` when the rate is not positive.
pub fn to_usd(ars: Decimal, tipo_cambio: Decimal) -> Option<Decimal> {
    if tipo_cambio <= Decimal::ZERO {
        return None;
    }
    ars.checked_div(tipo_cambio).map(round_money)
}

pub fn approx_eq(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b)
        .is_some_and(|diff| diff.abs() <= MONEY_TOLERANCE)
}

/// Line subtotal in the same currency as `unit_price`.
///
/// Returns `None` when the product does not fit a `Decimal`.
pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity)).map(round_money)
}

/// Sum of `amounts`, or `None` on overflow.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(d("1.005")), d("1.01"));
        assert_eq!(round_money(d("-1.005")), d("-1.01"));
        assert_eq!(round_money(d("2.344")), d("2.34"));
    }

    #[test]
    fn usd_conversion_requires_positive_rate() {
        assert_eq!(to_usd(d("1000"), d("0")), None);
        assert_eq!(to_usd(d("1000"), d("-5")), None);
        assert_eq!(to_usd(d("1000"), d("1200")), Some(d("0.83")));
    }

    #[test]
    fn rates_keep_four_decimals() {
        assert_eq!(round_rate(d("3.00005")), d("3.0001"));
        assert_eq!(round_rate(d("1234.56784")), d("1234.5678"));
        assert_eq!(round_rate(d("0.00004")), Decimal::ZERO);
    }

    #[test]
    fn overflowing_arithmetic_yields_none() {
        assert_eq!(line_subtotal(d("10.005"), 3), Some(d("30.02")));
        assert_eq!(line_subtotal(Decimal::MAX, 2), None);
        assert_eq!(checked_sum([d("1.50"), d("2.25")]), Some(d("3.75")));
        assert_eq!(checked_sum([Decimal::MAX, d("1")]), None);
    }

    #[test]
    fn tolerance_is_one_cent() {
        assert!(approx_eq(d("10.00"), d("10.01")));
        assert!(!approx_eq(d("10.00"), d("10.02")));
        assert!(!approx_eq(Decimal::MIN, d("1")));
    }
}

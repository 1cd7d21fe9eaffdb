//! Integer money arithmetic.
//!
//! Amounts are cents (`i64`), tax rates basis points and labour hundredths of
//! an hour. Division always rounds half away from zero.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Divide `numerator` by a positive `denominator`, rounding half up.
#[must_use]
pub fn div_round_half_up(numerator: i128, denominator: i128) -> i64 {
    let half = denominator / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    };
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}

/// Labour charge for `hundredths` of an hour at `rate_cents` per hour.
#[must_use]
pub fn labor_cents(hundredths: u32, rate_cents: i64) -> i64 {
    div_round_half_up(i128::from(hundredths) * i128::from(rate_cents), 100)
}

/// Tax on `subtotal_cents` at `rate_bps` basis points.
#[must_use]
pub fn tax_cents(subtotal_cents: i64, rate_bps: u32) -> i64 {
    div_round_half_up(i128::from(subtotal_cents) * i128::from(rate_bps), 10_000)
}

/// Monetary totals of a work order or invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub labor_cents: i64,
    pub parts_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl Totals {
    /// Combine labour and parts sums with the given tax rate.
    #[must_use]
    pub fn compute(labor: i64, parts: i64, rate_bps: u32) -> Self {
        let subtotal = labor.saturating_add(parts);
        let tax = tax_cents(subtotal, rate_bps);
        Self {
            labor_cents: labor,
            parts_cents: parts,
            subtotal_cents: subtotal,
            tax_cents: tax,
            total_cents: subtotal.saturating_add(tax),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(150, 8_000, 12_000)]
    #[case(1, 8_333, 83)]
    #[case(1, 8_350, 84)]
    #[case(0, 10_000, 0)]
    fn labor_rounds_half_up(#[case] hundredths: u32, #[case] rate: i64, #[case] expected: i64) {
        assert_eq!(labor_cents(hundredths, rate), expected);
    }

    #[rstest]
    #[case(10_000, 825, 825)]
    #[case(1_999, 825, 165)]
    #[case(100, 50, 1)]
    #[case(99, 50, 0)]
    fn tax_rounds_half_up(#[case] subtotal: i64, #[case] bps: u32, #[case] expected: i64) {
        assert_eq!(tax_cents(subtotal, bps), expected);
    }

    #[rstest]
    fn totals_combine_parts_and_labor() {
        let totals = Totals::compute(12_000, 4_500, 1_000);
        assert_eq!(totals.subtotal_cents, 16_500);
        assert_eq!(totals.tax_cents, 1_650);
        assert_eq!(totals.total_cents, 18_150);
    }
}

//! # Line Pricing
//!
//! Line totals and header aggregates. Everything is integer cents.
//!
//! ```text
//!   subtotal   = quantity × unit_price
//!   tax        = round_half_up(subtotal × bps / 10000)
//!   line_total = subtotal + tax − discount
//!
//!   header.subtotal = Σ line.subtotal      header.tax   = Σ line.tax
//!   header.discount = Σ line.discount      header.total = Σ line.line_total
//! ```
//!
//! Because the header is a sum of stored line values it always reconciles
//! with its lines, whatever the rounding did per line.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::TaxRate;

/// Computed amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    pub quantity: i64,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub discount: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub line_total: Money,
}

impl LinePricing {
    /// Prices a line, returning `None` if any intermediate amount overflows.
    ///
    /// Inputs are expected to be validated already (non-negative, tax in
    /// range, discount not above the subtotal).
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    /// use stockroom_core::pricing::LinePricing;
    /// use stockroom_core::types::TaxRate;
    ///
    /// let p = LinePricing::compute(10, Money::from_cents(2550), TaxRate::zero(), Money::zero())
    ///     .unwrap();
    /// assert_eq!(p.line_total.cents(), 25_500);
    /// ```
    pub fn compute(
        quantity: i64,
        unit_price: Money,
        tax_rate: TaxRate,
        discount: Money,
    ) -> Option<LinePricing> {
        let subtotal = unit_price.checked_multiply_quantity(quantity)?;
        let tax = subtotal.calculate_tax(tax_rate);
        let line_total = subtotal
            .cents()
            .checked_add(tax.cents())?
            .checked_sub(discount.cents())?;

        Some(LinePricing {
            quantity,
            unit_price,
            tax_rate,
            discount,
            subtotal,
            tax,
            line_total: Money::from_cents(line_total),
        })
    }
}

/// Header aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl TransactionTotals {
    /// Adds one line, returning `None` on overflow.
    pub fn checked_add_line(&self, line: &LinePricing) -> Option<TransactionTotals> {
        Some(TransactionTotals {
            subtotal: Money::from_cents(self.subtotal.cents().checked_add(line.subtotal.cents())?),
            discount: Money::from_cents(self.discount.cents().checked_add(line.discount.cents())?),
            tax: Money::from_cents(self.tax.cents().checked_add(line.tax.cents())?),
            total: Money::from_cents(self.total.cents().checked_add(line.line_total.cents())?),
        })
    }

    /// Sums a set of lines, returning `None` on overflow.
    pub fn from_lines<'a, I>(lines: I) -> Option<TransactionTotals>
    where
        I: IntoIterator<Item = &'a LinePricing>,
    {
        lines
            .into_iter()
            .try_fold(TransactionTotals::default(), |acc, line| acc.checked_add_line(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_with_tax_and_discount() {
        // 3 × $10.00 at 8.25% less $2.00: 3000 + 248 − 200
        let p = LinePricing::compute(
            3,
            Money::from_cents(1000),
            TaxRate::from_bps(825),
            Money::from_cents(200),
        )
        .unwrap();
        assert_eq!(p.subtotal.cents(), 3000);
        assert_eq!(p.tax.cents(), 248);
        assert_eq!(p.line_total.cents(), 3048);
    }

    #[test]
    fn test_overflow_is_none() {
        let p = LinePricing::compute(
            i64::MAX,
            Money::from_cents(2),
            TaxRate::zero(),
            Money::zero(),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_totals_sum_lines() {
        let a = LinePricing::compute(1, Money::from_cents(999), TaxRate::from_bps(1000), Money::zero())
            .unwrap();
        let b = LinePricing::compute(2, Money::from_cents(500), TaxRate::zero(), Money::from_cents(100))
            .unwrap();

        let totals = TransactionTotals::from_lines([&a, &b]).unwrap();
        assert_eq!(totals.subtotal.cents(), 1999);
        assert_eq!(totals.tax.cents(), 100);
        assert_eq!(totals.discount.cents(), 100);
        assert_eq!(totals.total.cents(), a.line_total.cents() + b.line_total.cents());
        assert_eq!(
            totals.total.cents(),
            totals.subtotal.cents() + totals.tax.cents() - totals.discount.cents()
        );
    }
}

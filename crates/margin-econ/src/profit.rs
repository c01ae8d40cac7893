//! Profit and margin from revenue, cost, fees and VAT treatment.

use margin_core::{margin_percent, Money, ProfitResult, VatSettings};
use rust_decimal::Decimal;

/// Profit and margin of a sale.
///
/// For VAT-registered sellers with a positive rate, VAT is first removed
/// from `revenue` (`round(revenue / (1 + rate/100))`) and margin is taken
/// against those net receipts. Margin is zero whenever the basis is zero.
///
/// Example:
/// let r = compute_profit(6000, 2000, 600, VatSettings::registered(Decimal::new(20, 0)));
/// assert_eq!((r.receipts_ex_vat, r.profit), (Some(5000), 2400));
pub fn compute_profit(
    revenue: Money,
    product_cost: Money,
    platform_fees: Money,
    vat: VatSettings,
) -> ProfitResult {
    if vat.applies() {
        let divisor = Decimal::ONE + vat.rate / Decimal::ONE_HUNDRED;
        let receipts = margin_core::round_half_up(Decimal::from(revenue) / divisor);
        let profit = receipts
            .saturating_sub(product_cost)
            .saturating_sub(platform_fees);
        return ProfitResult {
            profit,
            margin: margin_percent(profit, receipts),
            receipts_ex_vat: Some(receipts),
        };
    }
    let profit = revenue
        .saturating_sub(product_cost)
        .saturating_sub(platform_fees);
    ProfitResult {
        profit,
        margin: margin_percent(profit, revenue),
        receipts_ex_vat: None,
    }
}

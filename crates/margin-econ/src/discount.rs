//! How far a listing can be discounted before it stops making money.

use crate::fees::FeeCalculator;
use crate::profit::compute_profit;
use margin_core::{scale_money, Money, VatSettings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Discount levels evaluated when the caller supplies none.
pub const DEFAULT_DISCOUNTS: [u32; 7] = [10, 15, 20, 25, 30, 40, 50];

/// Economics of one discount level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountLevel {
    pub discount_percent: Decimal,
    pub discounted_price: Money,
    pub fees: Money,
    pub profit: Money,
    pub margin: Decimal,
    pub is_profitable: bool,
}

/// Profit across discount levels plus the sustainable-discount summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountAnalysis {
    pub levels: Vec<DiscountLevel>,
    /// Largest evaluated discount that is still profitable, zero if none is.
    pub max_profitable_discount: Decimal,
    /// Discount at which profit stops being positive, to one decimal place.
    pub break_even_discount: Decimal,
}

/// Sale facts shared by every discount level.
#[derive(Clone, Copy, Debug)]
pub struct DiscountInputs {
    pub sale_price: Money,
    pub product_cost: Money,
    pub shipping_cost: Money,
    pub seller_pays_shipping: bool,
    pub vat: VatSettings,
}

impl DiscountInputs {
    fn level<F: FeeCalculator + ?Sized>(&self, discount: Decimal, fees: &F) -> DiscountLevel {
        let factor = Decimal::ONE - discount / Decimal::ONE_HUNDRED;
        let discounted_price = scale_money(self.sale_price, factor);
        let fee_total = fees.total_fees(discounted_price, 1);
        let shipping = if self.seller_pays_shipping {
            self.shipping_cost
        } else {
            0
        };
        let revenue = discounted_price.saturating_add(shipping);
        let result = compute_profit(revenue, self.product_cost, fee_total, self.vat);
        DiscountLevel {
            discount_percent: discount,
            discounted_price,
            fees: fee_total,
            profit: result.profit,
            margin: result.margin,
            is_profitable: result.profit > 0,
        }
    }
}

/// Evaluate profit at each discount in `discounts` (defaults to [`DEFAULT_DISCOUNTS`]).
pub fn calculate_discount_analysis<F: FeeCalculator + ?Sized>(
    inputs: &DiscountInputs,
    fees: &F,
    discounts: Option<&[Decimal]>,
) -> DiscountAnalysis {
    let defaults: Vec<Decimal> = DEFAULT_DISCOUNTS.iter().map(|&d| Decimal::from(d)).collect();
    let discounts = discounts.unwrap_or(&defaults);

    let mut max_profitable_discount = Decimal::ZERO;
    let levels: Vec<DiscountLevel> = discounts
        .iter()
        .map(|&d| {
            let level = inputs.level(d, fees);
            trace!(discount = %d, profit = level.profit, "discount level");
            if level.is_profitable && d > max_profitable_discount {
                max_profitable_discount = d;
            }
            level
        })
        .collect();

    DiscountAnalysis {
        levels,
        max_profitable_discount,
        break_even_discount: find_break_even_discount(inputs, fees),
    }
}

/// Binary search for the discount where profit turns non-positive.
///
/// Returns zero straight away when the undiscounted sale already makes no
/// profit. The search narrows [0, 100] to half a point and floors the last
/// profitable discount to one decimal place.
pub fn find_break_even_discount<F: FeeCalculator + ?Sized>(
    inputs: &DiscountInputs,
    fees: &F,
) -> Decimal {
    if !inputs.level(Decimal::ZERO, fees).is_profitable {
        return Decimal::ZERO;
    }
    let tolerance = Decimal::new(5, 1);
    let two = Decimal::TWO;
    let mut low = Decimal::ZERO;
    let mut high = Decimal::ONE_HUNDRED;
    while high - low > tolerance {
        let mid = (low + high) / two;
        if inputs.level(mid, fees).is_profitable {
            low = mid;
        } else {
            high = mid;
        }
    }
    let result = (low * Decimal::TEN).floor() / Decimal::TEN;
    debug!(discount = %result, "break-even discount");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::ScheduleFees;
    use margin_core::{FeeBase, FeeTerm};

    fn inputs(sale_price: Money, cost: Money) -> DiscountInputs {
        DiscountInputs {
            sale_price,
            product_cost: cost,
            shipping_cost: 0,
            seller_pays_shipping: false,
            vat: VatSettings::NONE,
        }
    }

    fn ten_percent(price: Money, _qty: u32) -> Money {
        margin_core::percent_of(price, Decimal::TEN)
    }

    #[test]
    fn default_levels_and_max_profitable() {
        let analysis = calculate_discount_analysis(&inputs(10_000, 6_000), &ten_percent, None);
        assert_eq!(analysis.levels.len(), DEFAULT_DISCOUNTS.len());
        // 30% off: 7000 - 700 - 6000 = 300 profit; 40% off: 6000 - 600 - 6000 < 0
        let thirty = &analysis.levels[4];
        assert_eq!(thirty.discounted_price, 7_000);
        assert_eq!(thirty.profit, 300);
        assert!(thirty.is_profitable);
        assert!(!analysis.levels[5].is_profitable);
        assert_eq!(analysis.max_profitable_discount, Decimal::from(30));
    }

    #[test]
    fn break_even_discount_brackets_the_flip() {
        let inp = inputs(10_000, 6_000);
        let d = find_break_even_discount(&inp, &ten_percent);
        // profit(d) = 9000 * (1 - d/100) - 6000 -> zero at 33.33%
        assert!(d > Decimal::from(32) && d < Decimal::from(34), "got {d}");
        assert!(inp.level(d, &ten_percent).is_profitable);
        assert_eq!(d, (d * Decimal::TEN).floor() / Decimal::TEN);
    }

    #[test]
    fn unprofitable_sale_has_zero_break_even_discount() {
        let inp = inputs(5_000, 6_000);
        assert_eq!(find_break_even_discount(&inp, &ten_percent), Decimal::ZERO);
        let analysis = calculate_discount_analysis(&inp, &ten_percent, None);
        assert_eq!(analysis.max_profitable_discount, Decimal::ZERO);
        assert!(analysis.levels.iter().all(|l| !l.is_profitable));
    }

    fn with_shipping(seller_pays_shipping: bool) -> DiscountInputs {
        DiscountInputs {
            shipping_cost: 500,
            seller_pays_shipping,
            ..inputs(10_000, 6_000)
        }
    }

    #[test]
    fn seller_paid_shipping_counts_as_revenue() {
        let levels = [Decimal::from(20)];
        let analysis =
            calculate_discount_analysis(&with_shipping(true), &ten_percent, Some(&levels[..]));
        let level = &analysis.levels[0];
        assert_eq!(level.discounted_price, 8_000);
        assert_eq!(level.fees, 800);
        // 8000 + 500 - 6000 - 800
        assert_eq!(level.profit, 1_700);

        // profit(d) = 9000 * (1 - d/100) + 500 - 6000 -> zero at 38.89%
        let d = find_break_even_discount(&with_shipping(true), &ten_percent);
        assert!(d > Decimal::from(38) && d < Decimal::from(39), "got {d}");
    }

    #[test]
    fn buyer_paid_shipping_is_ignored() {
        let levels = [Decimal::from(20)];
        let analysis =
            calculate_discount_analysis(&with_shipping(false), &ten_percent, Some(&levels[..]));
        assert_eq!(analysis.levels[0].profit, 1_200);
        let d = find_break_even_discount(&with_shipping(false), &ten_percent);
        assert!(d > Decimal::from(32) && d < Decimal::from(34), "got {d}");
    }

    #[test]
    fn custom_levels_with_schedule_fees() {
        let schedule = [FeeTerm::percentage("Final value", FeeBase::Subtotal, Decimal::new(128, 1))];
        let calc = ScheduleFees::new(&schedule, 0);
        let levels = [Decimal::new(5, 0), Decimal::new(125, 1)];
        let analysis = calculate_discount_analysis(&inputs(2_000, 1_000), &calc, Some(&levels[..]));
        assert_eq!(analysis.levels.len(), 2);
        assert_eq!(analysis.levels[1].discounted_price, 1_750);
        assert_eq!(analysis.levels[1].fees, 224);
        assert_eq!(analysis.max_profitable_discount, Decimal::new(125, 1));
    }
}

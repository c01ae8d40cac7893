//! Per-unit economics across order quantities with bulk supplier discounts.

use crate::fees::FeeCalculator;
use crate::profit::compute_profit;
use margin_core::{round_half_up, scale_money, BulkDiscountTier, Money, VatSettings};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Quantities evaluated when the caller supplies none.
pub const DEFAULT_QUANTITIES: [u32; 6] = [1, 5, 10, 25, 50, 100];

/// Cost structure and price of a batch.
#[derive(Clone, Copy, Debug)]
pub struct BatchInputs {
    /// Unit cost before any bulk discount.
    pub base_unit_cost: Money,
    /// One-off costs (setup, tooling) spread across the batch.
    pub fixed_costs: Money,
    pub sale_price: Money,
    pub vat: VatSettings,
}

/// Economics of one order quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTier {
    pub quantity: u32,
    pub bulk_discount_percent: Decimal,
    pub unit_cost: Money,
    pub fixed_cost_per_unit: Money,
    pub total_unit_cost: Money,
    pub fees_per_unit: Money,
    pub profit_per_unit: Money,
    pub margin: Decimal,
    pub total_profit: Money,
    pub total_revenue: Money,
    pub total_cost: Money,
}

/// Quantity needed to recover fixed costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakEvenQuantity {
    Units(u64),
    /// Each unit loses money, so fixed costs are never recovered.
    Never,
}

/// Highest `min_qty` tier that `quantity` qualifies for.
fn select_tier(tiers_desc: &[BulkDiscountTier], quantity: u32) -> Option<&BulkDiscountTier> {
    tiers_desc.iter().find(|t| t.min_qty <= quantity)
}

fn per_unit(amount: Money, quantity: u32) -> Money {
    round_half_up(Decimal::from(amount) / Decimal::from(quantity))
}

/// Evaluate every quantity (defaults to [`DEFAULT_QUANTITIES`]).
///
/// `fees` is asked for the whole order's fees at `sale_price` per unit;
/// they are spread evenly per unit. Zero quantities are skipped.
pub fn calculate_batch_pricing<F: FeeCalculator + ?Sized>(
    inputs: &BatchInputs,
    fees: &F,
    tiers: Option<&[BulkDiscountTier]>,
    quantities: Option<&[u32]>,
) -> Vec<BatchTier> {
    let mut tiers_desc: Vec<BulkDiscountTier> = tiers.unwrap_or_default().to_vec();
    tiers_desc.sort_by(|a, b| b.min_qty.cmp(&a.min_qty));

    let quantities = quantities.unwrap_or(&DEFAULT_QUANTITIES);
    let mut out = Vec::with_capacity(quantities.len());
    for &quantity in quantities {
        if quantity == 0 {
            warn!("skipping zero quantity in batch pricing");
            continue;
        }
        let (bulk_discount_percent, unit_cost) = match select_tier(&tiers_desc, quantity) {
            Some(t) => (
                t.discount_percent,
                scale_money(
                    inputs.base_unit_cost,
                    Decimal::ONE - t.discount_percent / Decimal::ONE_HUNDRED,
                ),
            ),
            None => (Decimal::ZERO, inputs.base_unit_cost),
        };
        let fixed_cost_per_unit = per_unit(inputs.fixed_costs, quantity);
        let total_unit_cost = unit_cost.saturating_add(fixed_cost_per_unit);
        let fees_per_unit = per_unit(fees.total_fees(inputs.sale_price, quantity), quantity);
        let result = compute_profit(inputs.sale_price, total_unit_cost, fees_per_unit, inputs.vat);
        let qty = Money::from(quantity);
        trace!(quantity, profit_per_unit = result.profit, "batch tier");
        out.push(BatchTier {
            quantity,
            bulk_discount_percent,
            unit_cost,
            fixed_cost_per_unit,
            total_unit_cost,
            fees_per_unit,
            profit_per_unit: result.profit,
            margin: result.margin,
            total_profit: result.profit.saturating_mul(qty),
            total_revenue: inputs.sale_price.saturating_mul(qty),
            total_cost: total_unit_cost.saturating_mul(qty),
        });
    }
    out
}

/// Tier with the highest margin; ties go to the higher total profit.
pub fn find_most_profitable_quantity(tiers: &[BatchTier]) -> Option<&BatchTier> {
    tiers.iter().max_by(|a, b| {
        a.margin
            .cmp(&b.margin)
            .then_with(|| a.total_profit.cmp(&b.total_profit))
    })
}

/// Tier with the highest profit per unit.
pub fn find_optimal_bulk_quantity(tiers: &[BatchTier]) -> Option<&BatchTier> {
    tiers.iter().max_by_key(|t| t.profit_per_unit)
}

/// Units needed to recover `fixed_costs` at `profit_per_unit`.
pub fn calculate_break_even_quantity(fixed_costs: Money, profit_per_unit: Money) -> BreakEvenQuantity {
    if profit_per_unit <= 0 {
        return BreakEvenQuantity::Never;
    }
    if fixed_costs <= 0 {
        return BreakEvenQuantity::Units(0);
    }
    let units = (Decimal::from(fixed_costs) / Decimal::from(profit_per_unit)).ceil();
    units
        .to_u64()
        .map_or(BreakEvenQuantity::Never, BreakEvenQuantity::Units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs() -> BatchInputs {
        BatchInputs {
            base_unit_cost: 1_000,
            fixed_costs: 5_000,
            sale_price: 2_500,
            vat: VatSettings::NONE,
        }
    }

    fn tiers() -> Vec<BulkDiscountTier> {
        vec![
            BulkDiscountTier { min_qty: 10, discount_percent: Decimal::from(5) },
            BulkDiscountTier { min_qty: 50, discount_percent: Decimal::from(15) },
            BulkDiscountTier { min_qty: 25, discount_percent: Decimal::from(10) },
        ]
    }

    // 10% of the order value plus 30 per order.
    fn order_fees(price: Money, qty: u32) -> Money {
        margin_core::percent_of(price * Money::from(qty), Decimal::TEN) + 30
    }

    #[test]
    fn tiers_select_highest_qualifying_discount() {
        let t = tiers();
        let rows = calculate_batch_pricing(&inputs(), &order_fees, Some(t.as_slice()), None);
        let costs: Vec<(u32, Money)> = rows.iter().map(|r| (r.quantity, r.unit_cost)).collect();
        assert_eq!(
            costs,
            vec![(1, 1000), (5, 1000), (10, 950), (25, 900), (50, 850), (100, 850)]
        );
    }

    #[test]
    fn per_unit_spreading() {
        let rows = calculate_batch_pricing(&inputs(), &order_fees, None, Some(&[3][..]));
        let row = &rows[0];
        // 5000 / 3 = 1666.67 -> 1667; fees (750 + 30) / 3 = 260
        assert_eq!(row.fixed_cost_per_unit, 1667);
        assert_eq!(row.fees_per_unit, 260);
        assert_eq!(row.total_unit_cost, 2667);
        assert_eq!(row.profit_per_unit, 2500 - 2667 - 260);
        assert_eq!(row.total_profit, row.profit_per_unit * 3);
        assert_eq!(row.total_revenue, 7500);
    }

    #[test]
    fn zero_quantity_is_skipped() {
        let rows = calculate_batch_pricing(&inputs(), &order_fees, None, Some(&[0, 2][..]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 2);
    }

    #[test]
    fn selectors() {
        let t = tiers();
        let rows = calculate_batch_pricing(&inputs(), &order_fees, Some(t.as_slice()), None);
        let best = find_most_profitable_quantity(&rows).unwrap();
        assert_eq!(best.quantity, 100);
        assert!(rows.iter().all(|r| best.margin >= r.margin));
        assert_eq!(find_optimal_bulk_quantity(&rows).unwrap().quantity, 100);
        assert!(find_most_profitable_quantity(&[]).is_none());
    }

    #[test]
    fn margin_ties_prefer_total_profit() {
        let flat = BatchInputs { fixed_costs: 0, ..inputs() };
        let tenth = |p: Money, q: u32| p * Money::from(q) / 10;
        let rows = calculate_batch_pricing(&flat, &tenth, None, Some(&[1, 5][..]));
        assert_eq!(rows[0].margin, rows[1].margin);
        assert_eq!(find_most_profitable_quantity(&rows).unwrap().quantity, 5);
    }

    #[test]
    fn break_even_quantity() {
        assert_eq!(calculate_break_even_quantity(5_000, 300), BreakEvenQuantity::Units(17));
        assert_eq!(calculate_break_even_quantity(5_000, 500), BreakEvenQuantity::Units(10));
        assert_eq!(calculate_break_even_quantity(0, 500), BreakEvenQuantity::Units(0));
        assert_eq!(calculate_break_even_quantity(5_000, 0), BreakEvenQuantity::Never);
        assert_eq!(calculate_break_even_quantity(5_000, -20), BreakEvenQuantity::Never);
    }

    proptest! {
        #[test]
        fn most_profitable_has_max_margin(
            cost in 100i64..5_000,
            fixed in 0i64..50_000,
            price in 100i64..20_000,
        ) {
            let inp = BatchInputs { base_unit_cost: cost, fixed_costs: fixed, sale_price: price, vat: VatSettings::NONE };
            let t = tiers();
            let rows = calculate_batch_pricing(&inp, &order_fees, Some(t.as_slice()), None);
            let best = find_most_profitable_quantity(&rows).unwrap();
            prop_assert!(rows.iter().all(|r| best.margin >= r.margin));
        }
    }
}

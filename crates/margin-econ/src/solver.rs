//! Inverse pricing: break-even and target-margin prices.
//!
//! Both solvers are bounded damped fixed-point iterations over
//! [`compute_fees`] and [`compute_profit`]. Fee structures are piecewise
//! linear in price, so a damped step settles quickly without oscillating.
//! The solvers never fail: if the iteration cap is reached they return the
//! last estimate with `converged == false`.

use crate::fees::compute_fees;
use crate::profit::compute_profit;
use margin_core::{scale_money, FeeTerm, Money, ProfitResult, VatSettings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Hard cap on solver iterations.
pub const MAX_ITERATIONS: u32 = 100;

/// Upper clamp on candidate prices so unreachable targets cannot overflow.
pub const PRICE_CEILING: Money = 1_000_000_000_000_000;

/// Break-even tolerance in minor units.
const PROFIT_TOLERANCE: Money = 1;

/// Everything a solver needs besides the price itself.
#[derive(Clone, Copy, Debug)]
pub struct PricingInputs<'a> {
    pub product_cost: Money,
    pub shipping_cost: Money,
    pub seller_pays_shipping: bool,
    pub fee_schedule: &'a [FeeTerm],
    pub vat: VatSettings,
}

impl PricingInputs<'_> {
    /// Shipping that enters both the fee basis and revenue.
    fn fee_basis_shipping(&self) -> Money {
        if self.seller_pays_shipping {
            self.shipping_cost
        } else {
            0
        }
    }

    /// Profit and margin when listing at `price`.
    pub fn profit_at(&self, price: Money) -> ProfitResult {
        let shipping = self.fee_basis_shipping();
        let fees = compute_fees(price, shipping, 1, self.fee_schedule);
        let revenue = price.saturating_add(shipping);
        compute_profit(revenue, self.product_cost, fees.total, self.vat)
    }
}

/// Result of a price solve. `price` is always usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub price: Money,
    pub iterations: u32,
    pub converged: bool,
}

fn clamp_price(price: Money) -> Money {
    price.clamp(1, PRICE_CEILING)
}

/// Price at which profit is zero (within one minor unit).
pub fn calculate_break_even_price(inputs: &PricingInputs<'_>) -> SolveOutcome {
    let damping = Decimal::new(8, 1);
    let mut price = scale_money(inputs.product_cost, Decimal::new(12, 1)).min(PRICE_CEILING);
    for iteration in 1..=MAX_ITERATIONS {
        let profit = inputs.profit_at(price).profit;
        if profit.abs() <= PROFIT_TOLERANCE {
            debug!(price, iteration, "break-even price converged");
            return SolveOutcome {
                price,
                iterations: iteration,
                converged: true,
            };
        }
        let next = Decimal::from(price) - Decimal::from(profit) * damping;
        price = clamp_price(margin_core::round_half_up(next));
    }
    warn!(price, "break-even solver hit iteration cap; returning last estimate");
    SolveOutcome {
        price,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

/// Price whose margin is within 0.1 percentage points of `target_margin`.
pub fn calculate_target_price(inputs: &PricingInputs<'_>, target_margin: Decimal) -> SolveOutcome {
    let tolerance = Decimal::new(1, 1);
    let initial = Decimal::ONE + target_margin / Decimal::from(50);
    let mut price = scale_money(inputs.product_cost, initial).clamp(0, PRICE_CEILING);
    for iteration in 1..=MAX_ITERATIONS {
        let margin = inputs.profit_at(price).margin;
        let gap = target_margin - margin;
        if gap.abs() <= tolerance {
            debug!(price, iteration, %margin, "target price converged");
            return SolveOutcome {
                price,
                iterations: iteration,
                converged: true,
            };
        }
        price = clamp_price(scale_money(
            price,
            Decimal::ONE + gap / Decimal::ONE_HUNDRED,
        ));
    }
    warn!(price, %target_margin, "target price solver hit iteration cap; returning last estimate");
    SolveOutcome {
        price,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

//! Itemized marketplace fees.

use margin_core::{
    percent_of, round_half_up, FeeBase, FeeBreakdown, FeeLine, FeeTerm, FeeType, Money,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Compute itemized fees for one order.
///
/// `item_price` is the item line total (unit price times quantity);
/// `quantity` only scales fixed per-item terms. Terms that come to zero are
/// left out of the breakdown, so `total` is always the breakdown sum.
///
/// Example:
/// let schedule = [FeeTerm::percentage("Final value", FeeBase::Subtotal, Decimal::new(10, 0))];
/// assert_eq!(compute_fees(1000, 0, 1, &schedule).total, 100);
pub fn compute_fees(
    item_price: Money,
    shipping_cost: Money,
    quantity: u32,
    schedule: &[FeeTerm],
) -> FeeBreakdown {
    let subtotal = item_price.saturating_add(shipping_cost);
    let mut out = FeeBreakdown::default();
    for term in schedule {
        let amount = term_amount(term, item_price, shipping_cost, subtotal, quantity);
        if amount == 0 {
            continue;
        }
        out.total = out.total.saturating_add(amount);
        out.breakdown.push(FeeLine {
            label: term.label.clone(),
            amount,
        });
    }
    out
}

fn term_amount(
    term: &FeeTerm,
    item_price: Money,
    shipping_cost: Money,
    subtotal: Money,
    quantity: u32,
) -> Money {
    match term.fee_type {
        FeeType::Percentage => {
            let basis = match term.base {
                FeeBase::Item => item_price,
                FeeBase::Shipping => shipping_cost,
                FeeBase::Subtotal => subtotal,
            };
            percent_of(basis, term.value)
        }
        FeeType::Fixed => {
            let amount = round_half_up(term.value);
            match term.base {
                FeeBase::Item => amount.saturating_mul(Money::from(quantity)),
                FeeBase::Shipping | FeeBase::Subtotal => amount,
            }
        }
    }
}

/// Total fees charged when selling `quantity` units at a unit `price`.
///
/// Injected into the discount and batch analyses so callers can layer
/// payment-processing or promotional fee logic on top of a schedule.
pub trait FeeCalculator {
    fn total_fees(&self, price: Money, quantity: u32) -> Money;
}

impl<F> FeeCalculator for F
where
    F: Fn(Money, u32) -> Money,
{
    fn total_fees(&self, price: Money, quantity: u32) -> Money {
        self(price, quantity)
    }
}

/// Payment-processing charge on the amount the buyer pays.
///
/// Expressed as ordinary fee terms on the subtotal so that solvers and
/// injected calculators see the same fees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProcessing {
    /// Percent of the buyer's total (items plus shipping).
    pub percent: Decimal,
    /// Fixed charge per order in minor units.
    #[serde(default)]
    pub fixed: Money,
}

impl PaymentProcessing {
    pub fn fee_terms(&self) -> [FeeTerm; 2] {
        [
            FeeTerm::percentage("Payment processing", FeeBase::Subtotal, self.percent),
            FeeTerm::fixed("Payment processing (fixed)", FeeBase::Subtotal, self.fixed),
        ]
    }
}

/// Fee calculator backed by a fee schedule.
///
/// `price` is a unit price; the schedule is applied to the whole order of
/// `quantity` units plus shipping.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScheduleFees<'a> {
    pub schedule: &'a [FeeTerm],
    /// Shipping charged to the buyer, used as the shipping basis.
    pub shipping_cost: Money,
}

impl<'a> ScheduleFees<'a> {
    pub fn new(schedule: &'a [FeeTerm], shipping_cost: Money) -> Self {
        Self {
            schedule,
            shipping_cost,
        }
    }

    /// Itemized breakdown for `quantity` units.
    pub fn breakdown(&self, price: Money, quantity: u32) -> FeeBreakdown {
        let item_total = price.saturating_mul(Money::from(quantity));
        compute_fees(item_total, self.shipping_cost, quantity, self.schedule)
    }
}

impl FeeCalculator for ScheduleFees<'_> {
    fn total_fees(&self, price: Money, quantity: u32) -> Money {
        self.breakdown(price, quantity).total
    }
}

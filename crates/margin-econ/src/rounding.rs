//! Margin-safe psychological price rounding.
//!
//! Every mode except `None` moves a price up or leaves it unchanged, so a
//! rounded break-even or target price never erodes the margin it was
//! solved for.

use margin_core::{round_half_up, Money, RoundingMode, RoundingPolicy, MAJOR_UNIT};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Round `price` according to `policy`. The result is never below `price`.
///
/// Example:
/// assert_eq!(round_price(1099, &RoundingPolicy::new(RoundingMode::Nearest99)), 1199);
pub fn round_price(price: Money, policy: &RoundingPolicy) -> Money {
    match policy.mode {
        RoundingMode::None => price,
        RoundingMode::Increment => match policy.increment {
            Some(step) if step > 0 => round_up_to_increment(price, step),
            _ => {
                debug!(price, "increment rounding without a positive increment; unchanged");
                price
            }
        },
        RoundingMode::Nearest99 => round_to_ending(price, policy.custom_ending.unwrap_or(99)),
        RoundingMode::Nearest50 => round_to_ending(price, policy.custom_ending.unwrap_or(50)),
        RoundingMode::Nearest00 => round_to_ending(price, policy.custom_ending.unwrap_or(0)),
    }
}

fn round_up_to_increment(price: Money, step: Money) -> Money {
    if price.rem_euclid(step) == 0 {
        return price;
    }
    price
        .div_euclid(step)
        .saturating_add(1)
        .saturating_mul(step)
}

/// Move `price` up to the next amount whose minor part equals `ending`.
fn round_to_ending(price: Money, ending: Money) -> Money {
    let ending = ending.clamp(0, MAJOR_UNIT - 1);
    let major = price.div_euclid(MAJOR_UNIT);
    let minor = price.rem_euclid(MAJOR_UNIT);
    let base = major.saturating_mul(MAJOR_UNIT);
    if ending == 0 {
        if minor > 0 {
            return base.saturating_add(MAJOR_UNIT);
        }
        return base;
    }
    if minor >= ending {
        return base.saturating_add(MAJOR_UNIT).saturating_add(ending);
    }
    base + ending
}

/// Rung of a boost plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostStage {
    Launch,
    Growth,
    Target,
}

impl fmt::Display for BoostStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoostStage::Launch => "Launch",
            BoostStage::Growth => "Growth",
            BoostStage::Target => "Target",
        };
        f.pad(s)
    }
}

/// One price step of a boost plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostStep {
    pub stage: BoostStage,
    /// Price before rounding.
    pub raw_price: Money,
    /// Listing price after rounding and monotonicity repair.
    pub price: Money,
}

/// Three strictly increasing prices from just above break-even to the target.
///
/// Launch sits 5% above break-even and Growth halfway between Launch and
/// the target. If rounding collapses two rungs, the later one is bumped a
/// full major unit above its predecessor.
pub fn generate_boost_plan(
    break_even_price: Money,
    target_price: Money,
    policy: &RoundingPolicy,
) -> [BoostStep; 3] {
    let launch = break_even_price
        .saturating_add(round_half_up(Decimal::from(break_even_price) * Decimal::new(5, 2)));
    let growth = round_half_up(
        Decimal::from(launch) + Decimal::from(target_price - launch) / Decimal::TWO,
    );
    let mut steps = [
        (BoostStage::Launch, launch),
        (BoostStage::Growth, growth),
        (BoostStage::Target, target_price),
    ]
    .map(|(stage, raw_price)| BoostStep {
        stage,
        raw_price,
        price: round_price(raw_price, policy),
    });

    for i in 1..steps.len() {
        let previous = steps[i - 1].price;
        if steps[i].price <= previous {
            steps[i].price = previous.saturating_add(MAJOR_UNIT);
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(mode: RoundingMode) -> RoundingPolicy {
        RoundingPolicy::new(mode)
    }

    #[test]
    fn nearest_99() {
        let p = policy(RoundingMode::Nearest99);
        assert_eq!(round_price(1099, &p), 1199);
        assert_eq!(round_price(1050, &p), 1099);
        assert_eq!(round_price(1000, &p), 1099);
        assert_eq!(round_price(5, &p), 99);
    }

    #[test]
    fn nearest_50_and_00() {
        let p = policy(RoundingMode::Nearest50);
        assert_eq!(round_price(1049, &p), 1050);
        assert_eq!(round_price(1050, &p), 1150);
        let p = policy(RoundingMode::Nearest00);
        assert_eq!(round_price(1000, &p), 1000);
        assert_eq!(round_price(1001, &p), 1100);
    }

    #[test]
    fn custom_ending_and_increment() {
        let p = RoundingPolicy::ending(RoundingMode::Nearest99, 95);
        assert_eq!(round_price(1096, &p), 1195);
        assert_eq!(round_price(1020, &p), 1095);
        assert_eq!(round_price(1001, &RoundingPolicy::increment(25)), 1025);
        assert_eq!(round_price(1000, &RoundingPolicy::increment(25)), 1000);
        assert_eq!(round_price(1001, &policy(RoundingMode::Increment)), 1001);
        assert_eq!(round_price(1234, &policy(RoundingMode::None)), 1234);
    }

    #[test]
    fn boost_plan_repairs_collapsed_rungs() {
        let plan = generate_boost_plan(1000, 1000, &policy(RoundingMode::Nearest99));
        let prices: Vec<Money> = plan.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![1099, 1199, 1299]);
        assert_eq!(plan[0].raw_price, 1050);
        assert_eq!(plan[1].raw_price, 1025);
        assert_eq!(plan[2].stage, BoostStage::Target);
    }

    #[test]
    fn boost_plan_spreads_between_break_even_and_target() {
        let plan = generate_boost_plan(2000, 3000, &policy(RoundingMode::None));
        let prices: Vec<Money> = plan.iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![2100, 2550, 3000]);
    }

    fn any_policy() -> impl Strategy<Value = RoundingPolicy> {
        prop_oneof![
            Just(policy(RoundingMode::Nearest99)),
            Just(policy(RoundingMode::Nearest50)),
            Just(policy(RoundingMode::Nearest00)),
            (1i64..1_000).prop_map(RoundingPolicy::increment),
            (0i64..100).prop_map(|e| RoundingPolicy::ending(RoundingMode::Nearest99, e)),
        ]
    }

    proptest! {
        #[test]
        fn rounding_never_lowers_price(price in 0i64..10_000_000, p in any_policy()) {
            prop_assert!(round_price(price, &p) >= price);
        }

        #[test]
        fn rounding_is_monotonic(price in 0i64..10_000_000, p in any_policy()) {
            prop_assert!(round_price(price + 1, &p) >= round_price(price, &p));
        }

        #[test]
        fn boost_plan_strictly_increasing(
            be in 1i64..1_000_000,
            target in 1i64..2_000_000,
            p in any_policy(),
        ) {
            let plan = generate_boost_plan(be, target, &p);
            prop_assert_eq!(plan.len(), 3);
            prop_assert!(plan[0].price < plan[1].price);
            prop_assert!(plan[1].price < plan[2].price);
        }
    }
}

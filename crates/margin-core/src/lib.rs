#![deny(warnings)]

//! Core value types and invariants for the margin engine.
//!
//! Every monetary amount is an integer count of minor currency units
//! (pence, cents). Rates, percentages and margins are `Decimal` so that
//! each rounding step is exact and identical on every platform. All
//! types here are plain immutable values created per call.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monetary amount in minor currency units.
pub type Money = i64;

/// One hundred minor units, i.e. one major currency unit.
pub const MAJOR_UNIT: Money = 100;

/// Round half up (toward positive infinity at the midpoint) to whole minor units.
///
/// Saturates at the `i64` bounds instead of panicking.
///
/// Example:
/// assert_eq!(round_half_up(Decimal::new(185, 1)), 19);
/// assert_eq!(round_half_up(Decimal::new(-25, 1)), -2);
pub fn round_half_up(value: Decimal) -> Money {
    let rounded = (value + Decimal::new(5, 1)).floor();
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        Money::MIN
    } else {
        Money::MAX
    })
}

/// `round(amount * percent / 100)`.
pub fn percent_of(amount: Money, percent: Decimal) -> Money {
    round_half_up(Decimal::from(amount) * percent / Decimal::ONE_HUNDRED)
}

/// `round(amount * factor)`.
pub fn scale_money(amount: Money, factor: Decimal) -> Money {
    round_half_up(Decimal::from(amount) * factor)
}

/// `round(amount * (1 + delta_percent / 100))`.
pub fn adjust_by_percent(amount: Money, delta_percent: Decimal) -> Money {
    scale_money(amount, Decimal::ONE + delta_percent / Decimal::ONE_HUNDRED)
}

/// Profit as a percentage of `basis`; defined as zero when the basis is not positive.
pub fn margin_percent(profit: Money, basis: Money) -> Decimal {
    if basis <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(profit) / Decimal::from(basis) * Decimal::ONE_HUNDRED
}

/// Whether a fee term is a percentage of a basis or a fixed amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    /// `value` is a percentage in [0, 100] of the selected basis.
    Percentage,
    /// `value` is an amount in minor units.
    Fixed,
}

/// The monetary quantity a fee term is computed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBase {
    /// Item price. Fixed fees on this base are charged per item.
    Item,
    /// Shipping charged to the buyer.
    Shipping,
    /// Item price plus shipping. Fixed fees on this base are charged per order.
    Subtotal,
}

/// One named fee rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeTerm {
    /// Display label, e.g. "Final value fee".
    pub label: String,
    /// Percentage or fixed.
    #[serde(rename = "type")]
    pub fee_type: FeeType,
    /// Basis the term applies to.
    pub base: FeeBase,
    /// Percentage points or minor units depending on `fee_type`.
    pub value: Decimal,
}

impl FeeTerm {
    pub fn percentage(label: impl Into<String>, base: FeeBase, percent: Decimal) -> Self {
        Self {
            label: label.into(),
            fee_type: FeeType::Percentage,
            base,
            value: percent,
        }
    }

    pub fn fixed(label: impl Into<String>, base: FeeBase, amount: Money) -> Self {
        Self {
            label: label.into(),
            fee_type: FeeType::Fixed,
            base,
            value: Decimal::from(amount),
        }
    }
}

/// Ordered list of fee terms. Order only affects breakdown display order.
pub type FeeSchedule = Vec<FeeTerm>;

/// A single non-zero entry of an itemized fee breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLine {
    pub label: String,
    pub amount: Money,
}

/// Itemized fees. `total` always equals the sum of `breakdown` amounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub total: Money,
    pub breakdown: Vec<FeeLine>,
}

/// VAT treatment of the seller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatSettings {
    /// VAT rate in percent, e.g. 20.
    pub rate: Decimal,
    /// Whether the seller is VAT registered and must remit VAT from receipts.
    pub registered: bool,
}

impl VatSettings {
    /// Seller outside the VAT regime.
    pub const NONE: VatSettings = VatSettings {
        rate: Decimal::ZERO,
        registered: false,
    };

    pub fn registered(rate: Decimal) -> Self {
        Self {
            rate,
            registered: true,
        }
    }

    /// VAT is deducted from receipts only for registered sellers with a positive rate.
    pub fn applies(&self) -> bool {
        self.registered && self.rate > Decimal::ZERO
    }
}

/// Profit and margin of a sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitResult {
    /// Profit in minor units, negative for a loss.
    pub profit: Money,
    /// Margin in percent of the revenue basis; zero when the basis is zero.
    pub margin: Decimal,
    /// Receipts net of VAT, present only when VAT applies.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub receipts_ex_vat: Option<Money>,
}

/// Psychological price rounding modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundingMode {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "nearest_99")]
    Nearest99,
    #[serde(rename = "nearest_50")]
    Nearest50,
    #[serde(rename = "nearest_00")]
    Nearest00,
    #[serde(rename = "increment")]
    Increment,
}

/// Rounding policy applied to a computed price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    pub mode: RoundingMode,
    /// Step in minor units for `Increment` mode.
    #[serde(default)]
    pub increment: Option<Money>,
    /// Overrides the minor-unit ending (0..=99) of the ending-based modes.
    #[serde(default)]
    pub custom_ending: Option<Money>,
}

impl RoundingPolicy {
    pub fn new(mode: RoundingMode) -> Self {
        Self {
            mode,
            increment: None,
            custom_ending: None,
        }
    }

    pub fn increment(step: Money) -> Self {
        Self {
            mode: RoundingMode::Increment,
            increment: Some(step),
            custom_ending: None,
        }
    }

    pub fn ending(mode: RoundingMode, ending: Money) -> Self {
        Self {
            mode,
            increment: None,
            custom_ending: Some(ending),
        }
    }
}

/// Supplier discount applied to the unit cost once an order reaches `min_qty`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDiscountTier {
    pub min_qty: u32,
    /// Discount in percent off the base unit cost.
    pub discount_percent: Decimal,
}

/// Validation errors for caller-supplied inputs.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Price or cost must be non-negative.
    #[error("{0} must not be negative")]
    NegativeMoney(&'static str),
    /// Percentage outside [0, 100].
    #[error("{field} percentage {value} is outside [0, 100]")]
    PercentOutOfRange { field: String, value: Decimal },
    /// Fee labels must not be blank.
    #[error("fee term label must not be empty")]
    EmptyLabel,
    /// Fixed fee amounts must be whole minor units.
    #[error("fixed fee {0} must be a whole number of minor units")]
    FractionalFixedFee(String),
    /// Quantities must be at least one.
    #[error("quantity must be >= 1")]
    ZeroQuantity,
    /// Increment mode needs a positive increment.
    #[error("increment rounding requires a positive increment")]
    MissingIncrement,
    /// Custom endings are minor-unit values in [0, 99].
    #[error("custom ending {0} is outside [0, 99]")]
    EndingOutOfRange(Money),
    /// Bulk tiers must have distinct minimum quantities.
    #[error("duplicate bulk tier for min_qty {0}")]
    DuplicateTier(u32),
    /// Material and labour must add up to the product cost they split.
    #[error("cost split {split} does not add up to product cost {product_cost}")]
    CostSplitMismatch { split: Money, product_cost: Money },
}

fn validate_percent(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::PercentOutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

/// Validate a non-negative monetary input.
pub fn validate_money(field: &'static str, amount: Money) -> Result<(), ValidationError> {
    if amount < 0 {
        return Err(ValidationError::NegativeMoney(field));
    }
    Ok(())
}

/// Validate a single fee term.
pub fn validate_fee_term(term: &FeeTerm) -> Result<(), ValidationError> {
    if term.label.trim().is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    match term.fee_type {
        FeeType::Percentage => validate_percent(&term.label, term.value),
        FeeType::Fixed => {
            if term.value < Decimal::ZERO {
                return Err(ValidationError::NegativeMoney("fixed fee"));
            }
            if term.value.fract() != Decimal::ZERO {
                return Err(ValidationError::FractionalFixedFee(term.label.clone()));
            }
            Ok(())
        }
    }
}

/// Validate every term of a fee schedule.
pub fn validate_fee_schedule(schedule: &[FeeTerm]) -> Result<(), ValidationError> {
    schedule.iter().try_for_each(validate_fee_term)
}

/// Validate a rounding policy.
pub fn validate_rounding_policy(policy: &RoundingPolicy) -> Result<(), ValidationError> {
    match policy.mode {
        RoundingMode::Increment => match policy.increment {
            Some(step) if step > 0 => Ok(()),
            _ => Err(ValidationError::MissingIncrement),
        },
        RoundingMode::Nearest99 | RoundingMode::Nearest50 | RoundingMode::Nearest00 => {
            match policy.custom_ending {
                Some(e) if !(0..MAJOR_UNIT).contains(&e) => {
                    Err(ValidationError::EndingOutOfRange(e))
                }
                _ => Ok(()),
            }
        }
        RoundingMode::None => Ok(()),
    }
}

/// Validate bulk discount tiers: percentages in range, no duplicate thresholds.
pub fn validate_bulk_tiers(tiers: &[BulkDiscountTier]) -> Result<(), ValidationError> {
    let mut seen = std::collections::BTreeSet::new();
    for t in tiers {
        validate_percent("bulk discount", t.discount_percent)?;
        if !seen.insert(t.min_qty) {
            return Err(ValidationError::DuplicateTier(t.min_qty));
        }
    }
    Ok(())
}

/// Validate a material/labour split of `product_cost`.
pub fn validate_cost_split(
    material: Money,
    labour: Money,
    product_cost: Money,
) -> Result<(), ValidationError> {
    validate_money("material cost", material)?;
    validate_money("labour cost", labour)?;
    let split = material.saturating_add(labour);
    if split != product_cost {
        return Err(ValidationError::CostSplitMismatch {
            split,
            product_cost,
        });
    }
    Ok(())
}

/// Validate order quantities (each must be >= 1).
pub fn validate_quantities(quantities: &[u32]) -> Result<(), ValidationError> {
    if quantities.iter().any(|&q| q == 0) {
        return Err(ValidationError::ZeroQuantity);
    }
    Ok(())
}

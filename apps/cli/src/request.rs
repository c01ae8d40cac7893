//! Pricing request documents (YAML or JSON).

use anyhow::{Context, Result};
use margin_econ::{
    validate_bulk_tiers, validate_cost_split, validate_fee_schedule, validate_money,
    validate_quantities, validate_rounding_policy, BulkDiscountTier, FeeSchedule, FeeTerm, Money, PaymentProcessing,
    PricingInputs, RoundingPolicy, ScenarioConfig, ValidationError, VatSettings,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Split of the product cost used by the scenario analysis.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CostSplit {
    pub material: Money,
    #[serde(default)]
    pub labour: Money,
}

/// One listing to analyse. All amounts are minor units.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingRequest {
    pub sale_price: Money,
    pub product_cost: Money,
    #[serde(default)]
    pub shipping_cost: Money,
    #[serde(default)]
    pub seller_pays_shipping: bool,
    #[serde(default)]
    pub vat: VatSettings,
    pub fee_schedule: FeeSchedule,
    #[serde(default)]
    pub payment_processing: Option<PaymentProcessing>,
    #[serde(default)]
    pub target_margin: Option<Decimal>,
    #[serde(default)]
    pub rounding: RoundingPolicy,
    #[serde(default)]
    pub discounts: Option<Vec<Decimal>>,
    #[serde(default)]
    pub bulk_tiers: Vec<BulkDiscountTier>,
    #[serde(default)]
    pub quantities: Option<Vec<u32>>,
    #[serde(default)]
    pub fixed_costs: Money,
    #[serde(default)]
    pub cost_split: Option<CostSplit>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioConfig>,
}

impl PricingRequest {
    /// Load from disk; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let req = if is_json {
            serde_json::from_str(&text).context("parsing JSON request")?
        } else {
            serde_yaml::from_str(&text).context("parsing YAML request")?
        };
        Ok(req)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_money("sale price", self.sale_price)?;
        validate_money("product cost", self.product_cost)?;
        validate_money("shipping cost", self.shipping_cost)?;
        validate_money("fixed costs", self.fixed_costs)?;
        validate_fee_schedule(&self.schedule())?;
        validate_rounding_policy(&self.rounding)?;
        validate_bulk_tiers(&self.bulk_tiers)?;
        if let Some(split) = &self.cost_split {
            validate_cost_split(split.material, split.labour, self.product_cost)?;
        }
        if let Some(q) = &self.quantities {
            validate_quantities(q)?;
        }
        Ok(())
    }

    /// Marketplace schedule with payment processing folded in.
    pub fn schedule(&self) -> Vec<FeeTerm> {
        let mut terms = self.fee_schedule.clone();
        if let Some(payment) = &self.payment_processing {
            terms.extend(payment.fee_terms());
        }
        terms
    }

    /// Shipping that counts toward fees and revenue.
    pub fn fee_basis_shipping(&self) -> Money {
        if self.seller_pays_shipping {
            self.shipping_cost
        } else {
            0
        }
    }

    pub fn pricing_inputs<'a>(&self, schedule: &'a [FeeTerm]) -> PricingInputs<'a> {
        PricingInputs {
            product_cost: self.product_cost,
            shipping_cost: self.shipping_cost,
            seller_pays_shipping: self.seller_pays_shipping,
            fee_schedule: schedule,
            vat: self.vat,
        }
    }
}

//! Sensitivity analysis: profit and margin under cost and price shocks.
//!
//! [`calculate_scenario`] scales platform fees in proportion to the new
//! sale price (`new_fees = round(new_price * base_fees / base_price)`)
//! instead of re-running the fee schedule. Percentage-dominated schedules
//! track closely; fixed fees drift with the price. Use
//! [`calculate_scenario_exact`] to re-fee at the new price.

use crate::fees::FeeCalculator;
use crate::profit::compute_profit;
use margin_core::{adjust_by_percent, round_half_up, Money, VatSettings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Baseline economics of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub material_cost: Money,
    pub labour_cost: Money,
    pub shipping_cost: Money,
    pub sale_price: Money,
    /// Platform fees at `sale_price`.
    pub platform_fees: Money,
    pub base_profit: Money,
    pub base_margin: Decimal,
    #[serde(default)]
    pub vat: VatSettings,
}

/// Percentage changes applied to the baseline. Zero leaves a value as is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioDeltas {
    pub material_cost_change: Decimal,
    pub labour_cost_change: Decimal,
    pub shipping_cost_change: Decimal,
    pub sale_price_change: Decimal,
}

/// A named set of deltas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub deltas: ScenarioDeltas,
}

impl ScenarioConfig {
    fn new(name: &str, description: &str, deltas: ScenarioDeltas) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            deltas,
        }
    }
}

/// Outcome of one scenario against the baseline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub new_material_cost: Money,
    pub new_labour_cost: Money,
    pub new_shipping_cost: Money,
    pub new_total_cost: Money,
    pub new_sale_price: Money,
    pub new_fees: Money,
    pub new_profit: Money,
    pub new_margin: Decimal,
    pub profit_change: Money,
    pub margin_change: Decimal,
    pub is_profitable: bool,
}

/// The built-in scenario library.
pub fn preset_scenarios() -> Vec<ScenarioConfig> {
    let d = |material: i64, labour: i64, shipping: i64, price: i64| ScenarioDeltas {
        material_cost_change: Decimal::from(material),
        labour_cost_change: Decimal::from(labour),
        shipping_cost_change: Decimal::from(shipping),
        sale_price_change: Decimal::from(price),
    };
    vec![
        ScenarioConfig::new("Supplier Price +10%", "Material costs rise 10%", d(10, 0, 0, 0)),
        ScenarioConfig::new("Supplier Price +25%", "Material costs rise 25%", d(25, 0, 0, 0)),
        ScenarioConfig::new("Labour Cost +15%", "Labour costs rise 15%", d(0, 15, 0, 0)),
        ScenarioConfig::new("Shipping Cost +20%", "Carrier rates rise 20%", d(0, 0, 20, 0)),
        ScenarioConfig::new("Sale Price -10%", "Price cut to stay competitive", d(0, 0, 0, -10)),
        ScenarioConfig::new("Sale Price -20%", "Deep price cut or clearance", d(0, 0, 0, -20)),
        ScenarioConfig::new("Sale Price +10%", "Price rise holds demand", d(0, 0, 0, 10)),
        ScenarioConfig::new(
            "Perfect Storm",
            "Costs rise across the board while price falls",
            d(15, 10, 20, -10),
        ),
    ]
}

fn evaluate(
    params: &ScenarioParams,
    config: &ScenarioConfig,
    fees_at: impl FnOnce(Money) -> Money,
) -> ScenarioResult {
    let deltas = &config.deltas;
    let new_material_cost = adjust_by_percent(params.material_cost, deltas.material_cost_change);
    let new_labour_cost = adjust_by_percent(params.labour_cost, deltas.labour_cost_change);
    let new_shipping_cost = adjust_by_percent(params.shipping_cost, deltas.shipping_cost_change);
    let new_sale_price = adjust_by_percent(params.sale_price, deltas.sale_price_change);
    let new_total_cost = new_material_cost
        .saturating_add(new_labour_cost)
        .saturating_add(new_shipping_cost);
    let new_fees = fees_at(new_sale_price);
    let result = compute_profit(new_sale_price, new_total_cost, new_fees, params.vat);
    debug!(scenario = %config.name, profit = result.profit, "scenario evaluated");
    ScenarioResult {
        name: config.name.clone(),
        new_material_cost,
        new_labour_cost,
        new_shipping_cost,
        new_total_cost,
        new_sale_price,
        new_fees,
        new_profit: result.profit,
        new_margin: result.margin,
        profit_change: result.profit.saturating_sub(params.base_profit),
        margin_change: result.margin - params.base_margin,
        is_profitable: result.profit > 0,
    }
}

/// Apply `config` to the baseline, scaling fees proportionally to price.
pub fn calculate_scenario(params: &ScenarioParams, config: &ScenarioConfig) -> ScenarioResult {
    evaluate(params, config, |new_price| {
        if params.sale_price == 0 {
            return 0;
        }
        round_half_up(
            Decimal::from(new_price) * Decimal::from(params.platform_fees)
                / Decimal::from(params.sale_price),
        )
    })
}

/// Apply `config` to the baseline, recomputing fees at the new price.
pub fn calculate_scenario_exact<F: FeeCalculator + ?Sized>(
    params: &ScenarioParams,
    config: &ScenarioConfig,
    fees: &F,
) -> ScenarioResult {
    evaluate(params, config, |new_price| fees.total_fees(new_price, 1))
}

/// Evaluate a caller-supplied scenario library.
pub fn calculate_scenarios(params: &ScenarioParams, library: &[ScenarioConfig]) -> Vec<ScenarioResult> {
    library
        .iter()
        .map(|config| calculate_scenario(params, config))
        .collect()
}

/// Evaluate every preset from [`preset_scenarios`].
pub fn calculate_all_scenarios(params: &ScenarioParams) -> Vec<ScenarioResult> {
    calculate_scenarios(params, &preset_scenarios())
}

/// Evaluate ad-hoc slider deltas.
pub fn calculate_custom_scenario(params: &ScenarioParams, deltas: ScenarioDeltas) -> ScenarioResult {
    let config = ScenarioConfig::new("Custom Scenario", "User-defined changes", deltas);
    calculate_scenario(params, &config)
}

/// Scenario with the lowest profit.
pub fn find_worst_case_scenario(results: &[ScenarioResult]) -> Option<&ScenarioResult> {
    results.iter().min_by_key(|r| r.new_profit)
}

/// Scenario with the highest profit.
pub fn find_best_case_scenario(results: &[ScenarioResult]) -> Option<&ScenarioResult> {
    results.iter().max_by_key(|r| r.new_profit)
}

#![deny(warnings)]

//! Pricing economics for marketplace sellers.
//!
//! This crate provides deterministic, allocation-light utilities for:
//! - Itemized marketplace fees from a fee schedule
//! - Profit and margin with optional VAT treatment
//! - Break-even and target-margin price solving
//! - Discount sustainability analysis
//! - Per-unit economics across order quantities
//! - Margin-safe psychological price rounding and boost plans
//! - Cost/price sensitivity scenarios
//!
//! All functions are pure: no I/O, no shared state, safe to call from any thread.

pub mod batch;
pub mod discount;
pub mod fees;
pub mod profit;
pub mod rounding;
pub mod scenario;
pub mod solver;

pub use batch::{
    calculate_batch_pricing, calculate_break_even_quantity, find_most_profitable_quantity,
    find_optimal_bulk_quantity, BatchInputs, BatchTier, BreakEvenQuantity, DEFAULT_QUANTITIES,
};
pub use discount::{
    calculate_discount_analysis, find_break_even_discount, DiscountAnalysis, DiscountInputs,
    DiscountLevel, DEFAULT_DISCOUNTS,
};
pub use fees::{compute_fees, FeeCalculator, PaymentProcessing, ScheduleFees};
pub use margin_core::*;
pub use profit::compute_profit;
pub use rounding::{generate_boost_plan, round_price, BoostStage, BoostStep};
pub use scenario::{
    calculate_all_scenarios, calculate_custom_scenario, calculate_scenario,
    calculate_scenario_exact, calculate_scenarios, find_best_case_scenario,
    find_worst_case_scenario, preset_scenarios, ScenarioConfig, ScenarioDeltas, ScenarioParams,
    ScenarioResult,
};
pub use solver::{calculate_break_even_price, calculate_target_price, PricingInputs, SolveOutcome};

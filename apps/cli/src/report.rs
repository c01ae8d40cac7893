//! Runs the engine over a request and renders the result.

use crate::request::PricingRequest;
use margin_econ::{
    calculate_batch_pricing, calculate_break_even_price, calculate_break_even_quantity,
    calculate_discount_analysis, calculate_scenarios, calculate_target_price, compute_fees,
    compute_profit, find_best_case_scenario, find_most_profitable_quantity,
    find_optimal_bulk_quantity, find_worst_case_scenario, generate_boost_plan, preset_scenarios,
    round_price, BatchInputs, BatchTier, BoostStep, BreakEvenQuantity, DiscountAnalysis,
    DiscountInputs, FeeBreakdown, FeeCalculator, Money, ProfitResult, ScenarioParams,
    ScenarioResult, ScheduleFees, SolveOutcome,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct TargetReport {
    pub margin: Decimal,
    pub solve: SolveOutcome,
    pub rounded_price: Money,
    pub boost_plan: [BoostStep; 3],
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub tiers: Vec<BatchTier>,
    pub most_profitable_quantity: Option<u32>,
    pub optimal_bulk_quantity: Option<u32>,
    pub break_even_quantity: BreakEvenQuantity,
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub base_profit: Money,
    pub base_margin: Decimal,
    pub results: Vec<ScenarioResult>,
    pub worst_case: Option<String>,
    pub best_case: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub sale_price: Money,
    pub fees: FeeBreakdown,
    pub profit: ProfitResult,
    pub break_even: SolveOutcome,
    pub target: Option<TargetReport>,
    pub discounts: DiscountAnalysis,
    pub batch: BatchReport,
    pub scenarios: ScenarioReport,
}

pub fn build_report(req: &PricingRequest) -> Report {
    let schedule = req.schedule();
    let inputs = req.pricing_inputs(&schedule);
    let shipping = req.fee_basis_shipping();
    let calc = ScheduleFees::new(&schedule, shipping);

    let fees = compute_fees(req.sale_price, shipping, 1, &schedule);
    let profit = inputs.profit_at(req.sale_price);
    let break_even = calculate_break_even_price(&inputs);
    info!(price = break_even.price, converged = break_even.converged, "break-even solved");

    let target = req.target_margin.map(|margin| {
        let solve = calculate_target_price(&inputs, margin);
        TargetReport {
            margin,
            solve,
            rounded_price: round_price(solve.price, &req.rounding),
            boost_plan: generate_boost_plan(break_even.price, solve.price, &req.rounding),
        }
    });

    let discounts = calculate_discount_analysis(
        &DiscountInputs {
            sale_price: req.sale_price,
            product_cost: req.product_cost,
            shipping_cost: req.shipping_cost,
            seller_pays_shipping: req.seller_pays_shipping,
            vat: req.vat,
        },
        &calc,
        req.discounts.as_deref(),
    );

    let tiers = calculate_batch_pricing(
        &BatchInputs {
            base_unit_cost: req.product_cost,
            fixed_costs: req.fixed_costs,
            sale_price: req.sale_price,
            vat: req.vat,
        },
        &calc,
        Some(req.bulk_tiers.as_slice()),
        req.quantities.as_deref(),
    );
    let unit_profit = compute_profit(
        req.sale_price,
        req.product_cost,
        calc.total_fees(req.sale_price, 1),
        req.vat,
    );
    let batch = BatchReport {
        most_profitable_quantity: find_most_profitable_quantity(&tiers).map(|t| t.quantity),
        optimal_bulk_quantity: find_optimal_bulk_quantity(&tiers).map(|t| t.quantity),
        break_even_quantity: calculate_break_even_quantity(req.fixed_costs, unit_profit.profit),
        tiers,
    };

    let scenarios = build_scenarios(req, fees.total);

    Report {
        sale_price: req.sale_price,
        fees,
        profit,
        break_even,
        target,
        discounts,
        batch,
        scenarios,
    }
}

/// Scenario baseline priced with the same revenue rule as `PricingInputs::profit_at`:
/// shipping the seller pays is part of revenue, so it is not a scenario cost.
fn build_scenarios(req: &PricingRequest, platform_fees: Money) -> ScenarioReport {
    let (material_cost, labour_cost) = match req.cost_split {
        Some(split) => (split.material, split.labour),
        None => (req.product_cost, 0),
    };
    let revenue = req.sale_price.saturating_add(req.fee_basis_shipping());
    let base = compute_profit(
        revenue,
        material_cost.saturating_add(labour_cost),
        platform_fees,
        req.vat,
    );
    let params = ScenarioParams {
        material_cost,
        labour_cost,
        shipping_cost: 0,
        sale_price: revenue,
        platform_fees,
        base_profit: base.profit,
        base_margin: base.margin,
        vat: req.vat,
    };
    let mut library = preset_scenarios();
    library.extend(req.scenarios.iter().cloned());
    let results = calculate_scenarios(&params, &library);
    ScenarioReport {
        base_profit: base.profit,
        base_margin: base.margin,
        worst_case: find_worst_case_scenario(&results).map(|r| r.name.clone()),
        best_case: find_best_case_scenario(&results).map(|r| r.name.clone()),
        results,
    }
}

/// Minor units as a major-unit decimal string, e.g. `-1234` -> `-12.34`.
pub fn money(amount: Money) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn render_text(r: &Report) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        out,
        "Sale price {} | fees {} | profit {} | margin {:.1}%",
        money(r.sale_price),
        money(r.fees.total),
        money(r.profit.profit),
        r.profit.margin
    );
    for line in &r.fees.breakdown {
        let _ = writeln!(out, "  fee  {:<28} {:>10}", line.label, money(line.amount));
    }
    let _ = writeln!(
        out,
        "Break-even {} ({} iterations{})",
        money(r.break_even.price),
        r.break_even.iterations,
        if r.break_even.converged { "" } else { ", best effort" }
    );
    if let Some(t) = &r.target {
        let _ = writeln!(
            out,
            "Target {:.1}% -> {} (listed at {})",
            t.margin,
            money(t.solve.price),
            money(t.rounded_price)
        );
        for step in &t.boost_plan {
            let _ = writeln!(out, "  boost {:<8} {:>10}", step.stage, money(step.price));
        }
    }

    let d = &r.discounts;
    let _ = writeln!(
        out,
        "Discounts | max profitable {}% | break-even {}%",
        d.max_profitable_discount, d.break_even_discount
    );
    for l in &d.levels {
        let _ = writeln!(
            out,
            "  {:>5}% off {:>10} profit {:>10} margin {:.1}%",
            l.discount_percent,
            money(l.discounted_price),
            money(l.profit),
            l.margin
        );
    }

    let b = &r.batch;
    let _ = writeln!(
        out,
        "Batch | most profitable qty {:?} | best unit profit qty {:?} | break-even {:?}",
        b.most_profitable_quantity, b.optimal_bulk_quantity, b.break_even_quantity
    );
    for t in &b.tiers {
        let _ = writeln!(
            out,
            "  qty {:>5} unit cost {:>10} profit/unit {:>10} margin {:.1}%",
            t.quantity,
            money(t.total_unit_cost),
            money(t.profit_per_unit),
            t.margin
        );
    }

    let s = &r.scenarios;
    let _ = writeln!(
        out,
        "Scenarios | base profit {} | worst {:?} | best {:?}",
        money(s.base_profit),
        s.worst_case,
        s.best_case
    );
    for res in &s.results {
        let _ = writeln!(
            out,
            "  {:<24} profit {:>10} ({:+}) margin {:.1}%",
            res.name,
            money(res.new_profit),
            res.profit_change,
            res.new_margin
        );
    }
    out
}

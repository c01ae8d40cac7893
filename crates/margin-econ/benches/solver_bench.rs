use criterion::{black_box, criterion_group, criterion_main, Criterion};
use margin_econ::{
    calculate_batch_pricing, calculate_break_even_price, calculate_target_price, BatchInputs,
    FeeBase, FeeTerm, PricingInputs, ScheduleFees, VatSettings,
};
use rust_decimal::Decimal;

fn schedule() -> Vec<FeeTerm> {
    vec![
        FeeTerm::percentage("Final value fee", FeeBase::Subtotal, Decimal::new(128, 1)),
        FeeTerm::percentage("Regulatory fee", FeeBase::Subtotal, Decimal::new(35, 2)),
        FeeTerm::fixed("Order fee", FeeBase::Subtotal, 30),
        FeeTerm::fixed("Per item fee", FeeBase::Item, 15),
    ]
}

fn bench_solvers(c: &mut Criterion) {
    let schedule = schedule();
    let inputs = PricingInputs {
        product_cost: 2_000,
        shipping_cost: 350,
        seller_pays_shipping: true,
        fee_schedule: &schedule,
        vat: VatSettings::registered(Decimal::new(20, 0)),
    };
    c.bench_function("break_even_price", |b| {
        b.iter(|| calculate_break_even_price(black_box(&inputs)))
    });
    c.bench_function("target_price_35pct", |b| {
        b.iter(|| calculate_target_price(black_box(&inputs), Decimal::new(35, 0)))
    });
}

fn bench_batch(c: &mut Criterion) {
    let schedule = schedule();
    let fees = ScheduleFees::new(&schedule, 0);
    let inputs = BatchInputs {
        base_unit_cost: 1_200,
        fixed_costs: 25_000,
        sale_price: 3_500,
        vat: VatSettings::NONE,
    };
    c.bench_function("batch_default_quantities", |b| {
        b.iter(|| calculate_batch_pricing(black_box(&inputs), &fees, None, None))
    });
}

criterion_group!(benches, bench_solvers, bench_batch);
criterion_main!(benches);

use argus::broker::sim::SimBrokerBuilder;
use argus::broker::{GetsOrders, OrderRequest, ReceivesOrders};
use argus::clock::{ClockBuilder, Frequency};
use argus::config::TrackerOptions;
use argus::tracker::OrderActivityTracker;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::distributions::Uniform;
use rand::thread_rng;
use rand_distr::Distribution;
use time::macros::datetime;

pub fn full_session_random_fills() {
    let price_dist = Uniform::new(90.0, 100.0);
    let fill_dist = Uniform::new(1, 20);
    let mut rng = thread_rng();

    let clock = ClockBuilder::with_length_in_minutes(datetime!(2021-07-01 13:31 UTC), 389)
        .build(Frequency::Minute);
    let mut brkr = SimBrokerBuilder::new()
        .with_clock(clock.clone())
        .with_cash(1_000_000.0)
        .build();
    let mut tracker = OrderActivityTracker::new(TrackerOptions::default()).unwrap();
    let mut lines: Vec<String> = Vec::new();

    loop {
        let price = price_dist.sample(&mut rng);
        brkr.set_price("ABC", price);
        brkr.set_price("BCD", price / 2.0);

        for order in brkr.get_open_orders().into_values().flatten() {
            if order.created == clock.now() {
                continue;
            }
            let qty = fill_dist.sample(&mut rng) * order.amount.signum();
            brkr.fill(&order.id, qty, price).unwrap();
        }
        brkr.send_order(&OrderRequest::market("ABC", 100)).unwrap();
        brkr.send_order(&OrderRequest::market("BCD", -100)).unwrap();

        tracker.track(&brkr, &mut lines).unwrap();
        if !clock.has_next() {
            break;
        }
        clock.tick();
    }
}

fn benchmarks(c: &mut Criterion) {
    c.bench_function("full session", |b| b.iter(full_session_random_fills));
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);

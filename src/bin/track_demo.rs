use std::env;

use anyhow::Result;
use log::info;
use rand::distributions::Uniform;
use rand::{thread_rng, Rng};
use rand_distr::{Distribution, Normal};
use time::macros::datetime;

use argus::broker::sim::SimBrokerBuilder;
use argus::broker::{
    CashManager, GetsOrders, OrderRequest, OrderStyle, PositionInfo, ReceivesOrders,
};
use argus::clock::{ClockBuilder, Frequency};
use argus::config::TrackerOptions;
use argus::tracker::{InfoLog, OrderActivityTracker};

const SYMBOLS: [&str; 3] = ["ABC", "BCD", "CDE"];

//Runs one simulated hour with random prices and partial fills, logging tracker output.
//Usage: RUST_LOG=info track_demo [options.json]
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let options = match args.get(1) {
        Some(path) => TrackerOptions::from_path(path)?,
        None => TrackerOptions::default(),
    };

    let clock = ClockBuilder::with_length_in_minutes(datetime!(2021-07-01 13:31 UTC), 60)
        .build(Frequency::Minute);
    let mut brkr = SimBrokerBuilder::new()
        .with_clock(clock.clone())
        .with_cash(10_000.0)
        .build();
    let mut tracker = OrderActivityTracker::new(options)?;

    let mut rng = thread_rng();
    let step = Normal::new(0.0, 0.05)?;
    let fill_share = Uniform::new(0.2, 1.0);
    let mut prices = [10.0, 20.0, 30.0];

    loop {
        for (symbol, price) in SYMBOLS.iter().zip(prices.iter_mut()) {
            *price = f64::max(*price + step.sample(&mut rng), 0.01);
            brkr.set_price(symbol, *price);
        }

        for order in brkr.get_open_orders().into_values().flatten() {
            //Orders sent on this bar cannot execute until the next one
            if order.created == clock.now() {
                continue;
            }
            let Some(price) = SYMBOLS
                .iter()
                .position(|s| *s == order.symbol)
                .map(|i| prices[i])
            else {
                continue;
            };

            let roll: f64 = rng.gen();
            if roll < 0.05 {
                brkr.cancel(&order.id)?;
            } else if roll < 0.6 {
                let share = fill_share.sample(&mut rng);
                let qty = ((order.remaining() as f64) * share).round() as i64;
                if qty == 0 {
                    brkr.touch(&order.id)?;
                } else {
                    brkr.fill(&order.id, qty, price)?;
                }
            } else {
                brkr.touch(&order.id)?;
            }
        }

        if rng.gen_bool(0.15) {
            let i = rng.gen_range(0..SYMBOLS.len());
            let symbol = SYMBOLS[i];
            let held = brkr.get_position_qty(symbol);
            let qty = if held > 0 && rng.gen_bool(0.5) {
                -held
            } else {
                rng.gen_range(1..10) * 10
            };
            let style = if rng.gen_bool(0.2) {
                OrderStyle::Limit((prices[i] * 100.0).round() / 100.0)
            } else {
                OrderStyle::Plain
            };
            brkr.send_order(&OrderRequest {
                symbol: symbol.to_string(),
                qty,
                style,
            })?;
        }

        tracker.track(&brkr, &mut InfoLog)?;

        if !clock.has_next() {
            break;
        }
        clock.tick();
    }

    info!(
        "DEMO: Finished with {:?} trades, {:?} orders unresolved and cash {:.2}",
        brkr.log().trades().len(),
        tracker.ledger().len(),
        brkr.get_cash_balance()
    );
    Ok(())
}

use argus::broker::sim::{SimBroker, SimBrokerBuilder};
use argus::clock::{Clock, ClockBuilder, Frequency};
use argus::config::TrackerOptions;
use argus::tracker::OrderActivityTracker;
use time::macros::datetime;

//09:31 New York on a summer day, minute zero of the session
pub fn setup(cash: f64) -> (SimBroker, Clock) {
    let clock = ClockBuilder::with_length_in_minutes(datetime!(2021-07-01 13:31 UTC), 60)
        .build(Frequency::Minute);
    let mut brkr = SimBrokerBuilder::new()
        .with_clock(clock.clone())
        .with_cash(cash)
        .build();
    brkr.set_price("ABC", 10.0);
    brkr.set_price("BCD", 20.0);
    (brkr, clock)
}

pub fn tracker(options: TrackerOptions) -> OrderActivityTracker {
    OrderActivityTracker::new(options).unwrap()
}

pub fn line(head: &str, cash: &str, id: &str) -> String {
    format!("{:<52}  {}  {}", head, cash, id)
        .trim_end()
        .to_string()
}

//! # How does Argus work?
//!
//! Argus reports what happened to a strategy's orders on every bar. Trading platforms usually
//! expose orders only as snapshots: the requested quantity, the quantity filled so far, and a
//! status. A strategy that wants to see each fill, and the realised profit on trades that reduce
//! a position, has to diff those snapshots against what it saw last time.
//!
//! The library is built around three components: a `Broker`, a `Strategy`, and the
//! [tracker::OrderActivityTracker]. The broker is the host platform: it owns orders, positions,
//! prices and the clock. Argus only reads from it through the traits in [broker], so any platform
//! can be plugged in by implementing them. [broker::sim::SimBroker] is an in-memory implementation
//! used by the tests and by the `track_demo` binary. Fills are driven explicitly there, nothing
//! executes unless the caller says so.
//!
//! ## Tracking
//!
//! The tracker holds a ledger with the last filled quantity it reported for each order. On each
//! tick it resolves orders it already knows about (fills, completions, cancels, bars without a
//! fill) and then registers orders it sees open for the first time. Each change becomes one line
//! with the minute of the session as a prefix:
//!
//! ```text
//!    0   Buy 100 ABC _ at 10.00                           001a
//!    1      Bot 40/100 ABC (40) at 10.02                  001a
//!    2      Bot all 60/100 ABC (100) at 10.05             001a
//!   14   Sell -40 ABC (100) at 12.00                      001b
//!   15      Sold -40 ABC (60) at 12.00  (+80)             001b
//! ```
//!
//! Deltas are computed from absolute filled totals. If the host skips a bar the next line reports
//! the larger delta, nothing is double counted and nothing is lost. Display is configured with
//! [config::TrackerOptions], which can be loaded from JSON.
//!
//! ## Strategies
//!
//! Two strategies sit on top of the broker traits: a monthly Piotroski F-Score ranking
//! ([strategy::fscore]) and a daily earnings-announcement strategy ([strategy::earnings]). Both
//! produce target weights and use [broker::calculations::BrokerCalculations] to turn them into
//! orders.
//!
//! ## Example
//!
//! ```
//!     use argus::broker::sim::SimBrokerBuilder;
//!     use argus::broker::{OrderRequest, ReceivesOrders};
//!     use argus::clock::{ClockBuilder, Frequency};
//!     use argus::config::TrackerOptions;
//!     use argus::tracker::OrderActivityTracker;
//!     use time::macros::datetime;
//!
//!     let clock = ClockBuilder::with_length_in_minutes(datetime!(2021-07-01 13:31 UTC), 10)
//!         .build(Frequency::Minute);
//!     let mut brkr = SimBrokerBuilder::new()
//!         .with_clock(clock.clone())
//!         .with_cash(10_000.0)
//!         .build();
//!     brkr.set_price("ABC", 10.0);
//!
//!     let mut tracker = OrderActivityTracker::new(TrackerOptions::default()).unwrap();
//!     let mut lines: Vec<String> = Vec::new();
//!
//!     let id = brkr.send_order(&OrderRequest::market("ABC", 100)).unwrap();
//!     tracker.track(&brkr, &mut lines).unwrap();
//!
//!     clock.tick();
//!     brkr.fill(&id, 100, 10.0).unwrap();
//!     tracker.track(&brkr, &mut lines).unwrap();
//!
//!     assert_eq!(lines.len(), 2);
//!     assert!(tracker.ledger().is_empty());
//! ```

pub mod broker;
pub mod clock;
pub mod config;
pub mod error;
pub mod schedule;
pub mod strategy;
pub mod tracker;

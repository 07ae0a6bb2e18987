//! Order activity tracking.
//!
//! The host platform only exposes the current state of each order. To show what happened on a
//! bar, [OrderActivityTracker] keeps a [Ledger] with the filled quantity it last reported for every
//! order it has seen open, and on each tick compares fresh snapshots against it:
//!
//! ```text
//! absent -> registered(0) -> registered(k), k non-decreasing -> resolved (entry deleted)
//! ```
//!
//! Resolution happens on a full fill or a cancel, from any registered state, and is reported
//! exactly once. Deltas are taken from absolute filled totals so a skipped tick only makes the
//! next delta larger.
//!
//! Lines are written to an [ActivitySink] as they are produced. [InfoLog] sends them through the
//! `log` facade, a `Vec<String>` collects them.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::broker::{Broker, Order, OrderId, OrderStatus};
use crate::config::TrackerOptions;
use crate::error::ArgusError;
use crate::schedule::ActivityWindow;

pub mod activity;

pub use activity::{Activity, ActivityKind, FillAmount};

pub trait ActivitySink {
    fn log(&mut self, line: &str);
}

impl ActivitySink for Vec<String> {
    fn log(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

///Writes every line at info level.
pub struct InfoLog;

impl ActivitySink for InfoLog {
    fn log(&mut self, line: &str) {
        info!("{}", line);
    }
}

///Filled quantity last reported for each unresolved order.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    inner: BTreeMap<OrderId, i64>,
}

impl Ledger {
    pub fn get(&self, id: &OrderId) -> Option<i64> {
        self.inner.get(id).copied()
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.inner.contains_key(id)
    }

    pub fn ids(&self) -> Vec<OrderId> {
        self.inner.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    //Set-once, returns false if the order was already known
    fn register(&mut self, id: &OrderId) -> bool {
        if self.inner.contains_key(id) {
            return false;
        }
        self.inner.insert(id.clone(), 0);
        true
    }

    //Never moves backwards
    fn record(&mut self, id: &OrderId, filled: i64) {
        if let Some(previous) = self.inner.get_mut(id) {
            if filled.abs() > previous.abs() {
                *previous = filled;
            }
        }
    }

    fn resolve(&mut self, id: &OrderId) {
        self.inner.remove(id);
    }
}

pub struct OrderActivityTracker {
    ledger: Ledger,
    options: TrackerOptions,
    window: ActivityWindow,
}

impl OrderActivityTracker {
    pub fn new(options: TrackerOptions) -> Result<Self, ArgusError> {
        let window = options.window()?;
        Ok(Self {
            ledger: Ledger::default(),
            options,
            window,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    ///Current price, falling back to the last sale of the position when the symbol is untradeable.
    fn price(symbol: &str, brkr: &impl Broker) -> Result<f64, ArgusError> {
        if let Some(price) = brkr.current_price(symbol) {
            return Ok(price);
        }
        brkr.get_position(symbol)
            .map(|position| position.last_sale_price)
            .ok_or_else(|| ArgusError::MissingPrice {
                symbol: symbol.to_string(),
            })
    }

    fn activity(&self, order: &Order, minute: i64, price: f64, cash: Option<i64>) -> Activity {
        Activity {
            minute,
            order_id: order.id.clone(),
            symbol: order.symbol.clone(),
            amount: order.amount,
            price,
            style: order.style,
            cash,
            show_id: self.options.log_ids,
            kind: ActivityKind::Canceled,
        }
    }

    fn resolve(
        &mut self,
        order: &Order,
        brkr: &impl Broker,
        minute: i64,
        cash: Option<i64>,
    ) -> Result<Option<Activity>, ArgusError> {
        //No bar has passed since submission so there cannot be anything to report
        if order.dt == order.created {
            return Ok(None);
        }

        let previous = self.ledger.get(&order.id).unwrap_or(0);
        let complete = order.status == OrderStatus::Filled;

        if order.status == OrderStatus::Canceled {
            let price = Self::price(&order.symbol, brkr)?;
            self.ledger.resolve(&order.id);
            debug!("TRACKER: Resolved canceled order {:?}", order.id);
            return Ok(Some(self.activity(order, minute, price, cash)));
        }

        if complete || order.filled.abs() > previous.abs() {
            let delta = order.filled - previous;
            let price = if delta != 0 {
                Some(Self::price(&order.symbol, brkr)?)
            } else {
                None
            };

            if complete {
                self.ledger.resolve(&order.id);
                debug!("TRACKER: Resolved filled order {:?}", order.id);
            } else {
                self.ledger.record(&order.id, order.filled);
            }

            let Some(price) = price else {
                return Ok(None);
            };

            let fill = match (complete, previous) {
                (true, 0) => FillAmount::Whole {
                    amount: order.amount,
                },
                (true, _) => FillAmount::Rest {
                    filled: delta,
                    amount: order.amount,
                },
                (false, _) => FillAmount::Partial {
                    filled: delta,
                    amount: order.amount,
                },
            };

            //Position and cost basis come from the same snapshot, taken after the fill applied
            let position = brkr.get_position(&order.symbol);
            let position_qty = position.as_ref().map(|p| p.amount).unwrap_or(0);
            let pnl = match position {
                Some(position)
                    if (position_qty - order.filled) * order.filled < 0
                        && position.cost_basis != 0.0 =>
                {
                    Some(-(delta as f64) * (price - position.cost_basis))
                }
                _ => None,
            };

            let mut activity = self.activity(order, minute, price, cash);
            activity.kind = ActivityKind::Filled {
                fill,
                delta,
                position: position_qty,
                pnl,
            };
            return Ok(Some(activity));
        }

        if order.filled == 0 && order.style.is_plain() && self.options.log_unfilled {
            let mut activity = self.activity(order, minute, 0.0, cash);
            activity.kind = ActivityKind::Unfilled;
            return Ok(Some(activity));
        }
        Ok(None)
    }

    ///Reconciles the host's orders against the ledger and reports what changed since the last
    ///tick.
    ///
    ///Known orders are resolved first, in id order, then orders seen open for the first time are
    ///registered. Each line is written to `sink` as soon as it is produced and the same activity
    ///is returned. An error aborts the rest of the tick, anything already reported stays
    ///reported.
    pub fn track(
        &mut self,
        brkr: &impl Broker,
        sink: &mut impl ActivitySink,
    ) -> Result<Vec<Activity>, ArgusError> {
        let now = brkr.now();
        let session = &self.options.session;
        if !self.window.update(session.local_date(now)?) {
            return Ok(Vec::new());
        }
        let minute = session.minute(now)?;
        let balance = brkr.get_cash_balance();
        let cash = if self.options.show_cash(balance) {
            Some(balance as i64)
        } else {
            None
        };

        let mut reported = Vec::new();
        for id in self.ledger.ids() {
            let order = brkr
                .get_order(&id)
                .ok_or_else(|| ArgusError::UnknownOrder {
                    order_id: id.clone(),
                })?;
            if let Some(activity) = self.resolve(&order, brkr, minute, cash)? {
                sink.log(&activity.to_string());
                reported.push(activity);
            }
        }

        for order in brkr.get_open_orders().into_values().flatten() {
            if self.ledger.contains(&order.id) {
                continue;
            }
            let price = Self::price(&order.symbol, brkr)?;
            self.ledger.register(&order.id);
            debug!("TRACKER: Registered order {:?}", order.id);

            let mut activity = self.activity(&order, minute, price, cash);
            activity.kind = ActivityKind::Placed {
                position: brkr.get_position_qty(&order.symbol),
            };
            sink.log(&activity.to_string());
            reported.push(activity);
        }
        Ok(reported)
    }
}

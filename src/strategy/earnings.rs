use std::collections::VecDeque;

use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use super::{PortfolioAllocation, Strategy};
use crate::broker::calculations::BrokerCalculations;
use crate::broker::{Broker, OrderId, ReceivesOrders};
use crate::error::ArgusError;

pub const PRE_EARNINGS_HOLD: usize = 2;
pub const POST_EARNINGS_HOLD: usize = 5;

///Rolling buckets of names, newest first. Each bucket holds the names picked on one day.
#[derive(Clone, Debug, PartialEq)]
pub struct HoldingRecord {
    buckets: VecDeque<Vec<String>>,
}

impl Default for HoldingRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldingRecord {
    pub fn new() -> Self {
        Self {
            buckets: VecDeque::from(vec![Vec::new(); 5]),
        }
    }

    ///Pushes `bucket` at the front, drops trailing empty buckets beyond `days_to_hold`, and
    ///then drops the oldest bucket if more than `days_to_hold` of them hold names.
    pub fn update(&mut self, bucket: Vec<String>, days_to_hold: usize) {
        self.buckets.push_front(bucket);
        while self.buckets.len() > days_to_hold
            && self.buckets.back().is_some_and(|last| last.is_empty())
        {
            self.buckets.pop_back();
        }
        let filled = self.buckets.iter().filter(|b| !b.is_empty()).count();
        if filled > days_to_hold {
            self.buckets.pop_back();
        }
    }

    pub fn buckets(&self) -> &VecDeque<Vec<String>> {
        &self.buckets
    }

    ///Every name currently held, newest first, each once.
    pub fn names(&self) -> Vec<String> {
        self.buckets.iter().flatten().unique().cloned().collect()
    }
}

///Names picked by one earnings screen for a single day.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EarningsCandidates {
    pub longs: Vec<String>,
    pub shorts: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccountSnapshot {
    pub leverage: f64,
    pub positions: usize,
}

///Trades around earnings announcements: names screened the day before an announcement are held
///for [PRE_EARNINGS_HOLD] days, names screened the day after for [POST_EARNINGS_HOLD] days.
///
///Each side splits `max_leverage` evenly between its names, capped at `max_in_one` per name.
#[derive(Clone, Debug)]
pub struct EarningsStrategy {
    longs: HoldingRecord,
    shorts: HoldingRecord,
    max_leverage: f64,
    max_in_one: f64,
}

impl Default for EarningsStrategy {
    fn default() -> Self {
        Self::new(0.5, 0.1)
    }
}

impl EarningsStrategy {
    pub fn new(max_leverage: f64, max_in_one: f64) -> Self {
        Self {
            longs: HoldingRecord::new(),
            shorts: HoldingRecord::new(),
            max_leverage,
            max_in_one,
        }
    }

    pub fn longs(&self) -> &HoldingRecord {
        &self.longs
    }

    pub fn shorts(&self) -> &HoldingRecord {
        &self.shorts
    }

    pub fn before_trading_start(&mut self, pre: &EarningsCandidates, post: &EarningsCandidates) {
        self.longs.update(pre.longs.clone(), PRE_EARNINGS_HOLD);
        self.shorts.update(pre.shorts.clone(), PRE_EARNINGS_HOLD);
        self.longs.update(post.longs.clone(), POST_EARNINGS_HOLD);
        self.shorts.update(post.shorts.clone(), POST_EARNINGS_HOLD);
    }

    fn weight(&self, count: usize) -> f64 {
        (self.max_leverage / count as f64).min(self.max_in_one)
    }

    pub fn target_weights(&self, brkr: &impl Broker) -> PortfolioAllocation {
        let longs = self.longs.names();
        let shorts = self.shorts.names();
        let mut target = PortfolioAllocation::new();

        for symbol in longs.iter().filter(|s| brkr.can_trade(s)) {
            target.insert(symbol.clone(), self.weight(longs.len()));
        }
        for symbol in shorts.iter().filter(|s| brkr.can_trade(s)) {
            target.insert(symbol.clone(), -self.weight(shorts.len()));
        }
        for symbol in brkr.get_positions() {
            if !longs.contains(&symbol) && !shorts.contains(&symbol) {
                target.insert(symbol, 0.0);
            }
        }
        target
    }

    ///Gross exposure over liquidation value and the number of open positions, logged at the close.
    pub fn record_vars(&self, brkr: &impl Broker) -> AccountSnapshot {
        let positions = brkr.get_positions();
        let gross: f64 = positions
            .iter()
            .filter_map(|symbol| brkr.get_position(symbol))
            .map(|p| {
                let price = brkr.current_price(&p.symbol).unwrap_or(p.last_sale_price);
                (p.amount as f64 * price).abs()
            })
            .sum();
        let value = brkr.get_liquidation_value();
        let leverage = if value > 0.0 { gross / value } else { 0.0 };
        info!(
            "STRATEGY: Leverage {:.2} across {:?} positions",
            leverage,
            positions.len()
        );
        AccountSnapshot {
            leverage,
            positions: positions.len(),
        }
    }
}

impl Strategy for EarningsStrategy {
    fn update<B: Broker + ReceivesOrders>(
        &mut self,
        brkr: &mut B,
    ) -> Result<Vec<OrderId>, ArgusError> {
        let target = self.target_weights(&*brkr);
        let orders = BrokerCalculations::diff_against_target_weights(&target, &*brkr);
        brkr.send_orders(&orders)
    }
}

#[cfg(test)]
mod tests {
    use super::{EarningsCandidates, EarningsStrategy, HoldingRecord};
    use crate::broker::sim::{SimBroker, SimBrokerBuilder};
    use crate::broker::{GetsOrders, OrderRequest, ReceivesOrders};
    use crate::clock::{ClockBuilder, Frequency};
    use crate::strategy::Strategy;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn setup() -> SimBroker {
        let clock = ClockBuilder::with_length_in_minutes(0, 10).build(Frequency::Minute);
        let mut brkr = SimBrokerBuilder::new()
            .with_clock(clock)
            .with_cash(100_000.0)
            .build();
        for symbol in ["ABC", "BCD", "CDE", "XYZ"] {
            brkr.set_price(symbol, 10.0);
        }
        brkr
    }

    #[test]
    fn test_that_record_starts_with_five_empty_buckets() {
        let record = HoldingRecord::new();
        assert_eq!(record.buckets().len(), 5);
        assert!(record.names().is_empty());
    }

    #[test]
    fn test_that_record_drops_trailing_empty_buckets() {
        let mut record = HoldingRecord::new();
        record.update(names(&["ABC"]), 2);
        assert_eq!(record.buckets().len(), 2);
        assert_eq!(record.names(), names(&["ABC"]));

        record.update(Vec::new(), 5);
        assert_eq!(record.buckets().len(), 3);
    }

    #[test]
    fn test_that_record_drops_oldest_when_too_many_filled() {
        let mut record = HoldingRecord::new();
        record.update(names(&["A"]), 2);
        record.update(names(&["B"]), 2);
        assert_eq!(record.names(), names(&["B", "A"]));

        record.update(names(&["C"]), 2);
        assert_eq!(record.names(), names(&["C", "B"]));
    }

    #[test]
    fn test_that_names_are_deduplicated() {
        let mut record = HoldingRecord::new();
        record.update(names(&["A", "B"]), 5);
        record.update(names(&["B"]), 5);
        assert_eq!(record.names(), names(&["B", "A"]));
    }

    #[test]
    fn test_that_weights_are_capped_per_name() {
        let brkr = setup();
        let mut strat = EarningsStrategy::default();
        let pre = EarningsCandidates {
            longs: names(&["ABC"]),
            shorts: names(&["BCD", "CDE"]),
        };
        strat.before_trading_start(&pre, &EarningsCandidates::default());

        let target = strat.target_weights(&brkr);
        //0.5 / 1 capped at 0.1
        assert_eq!(*target.get("ABC").unwrap(), 0.1);
        assert_eq!(*target.get("BCD").unwrap(), -0.1);
        assert_eq!(*target.get("CDE").unwrap(), -0.1);
    }

    #[test]
    fn test_that_weights_split_leverage_when_many_names() {
        let brkr = setup();
        let mut strat = EarningsStrategy::new(0.5, 0.5);
        let post = EarningsCandidates {
            longs: names(&["ABC", "BCD", "CDE", "XYZ"]),
            shorts: Vec::new(),
        };
        strat.before_trading_start(&EarningsCandidates::default(), &post);
        let target = strat.target_weights(&brkr);
        assert_eq!(*target.get("XYZ").unwrap(), 0.125);
    }

    #[test]
    fn test_that_untradeable_names_are_skipped_and_stale_positions_exit() {
        let mut brkr = setup();
        let held = brkr.send_order(&OrderRequest::market("XYZ", 100)).unwrap();
        brkr.fill(&held, 100, 10.0).unwrap();
        let other = brkr.send_order(&OrderRequest::market("CDE", 50)).unwrap();
        brkr.fill(&other, 50, 10.0).unwrap();
        brkr.halt("CDE");

        let mut strat = EarningsStrategy::default();
        let pre = EarningsCandidates {
            longs: names(&["ABC", "CDE"]),
            shorts: Vec::new(),
        };
        strat.before_trading_start(&pre, &EarningsCandidates::default());

        let target = strat.target_weights(&brkr);
        assert!(!target.contains_key("CDE"));
        assert_eq!(*target.get("XYZ").unwrap(), 0.0);

        let ids = strat.update(&mut brkr).unwrap();
        let orders: Vec<(String, i64)> = ids
            .iter()
            .filter_map(|id| brkr.get_order(id))
            .map(|o| (o.symbol, o.amount))
            .collect();
        assert_eq!(
            orders,
            vec![("XYZ".to_string(), -100), ("ABC".to_string(), 1_000)]
        );
    }

    #[test]
    fn test_that_record_vars_reports_gross_leverage() {
        let mut brkr = setup();
        let long = brkr.send_order(&OrderRequest::market("ABC", 1_000)).unwrap();
        brkr.fill(&long, 1_000, 10.0).unwrap();
        let short = brkr.send_order(&OrderRequest::market("BCD", -1_000)).unwrap();
        brkr.fill(&short, -1_000, 10.0).unwrap();

        let snapshot = EarningsStrategy::default().record_vars(&brkr);
        assert_eq!(snapshot.positions, 2);
        assert_eq!(snapshot.leverage, 0.2);
    }
}

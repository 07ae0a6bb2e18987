use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::clock::DateTime;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum TradeType {
    Buy,
    Sell,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Trade {
    pub symbol: String,
    ///Always non-negative, direction is carried by `typ`.
    pub quantity: i64,
    pub price: f64,
    pub date: DateTime,
    pub typ: TradeType,
}

impl Trade {
    fn signed_quantity(&self) -> i64 {
        match self.typ {
            TradeType::Buy => self.quantity,
            TradeType::Sell => -self.quantity,
        }
    }
}

//Records trades executed by the broker.
//
//Should be available to clients, but is also needed internally to calculate the cost basis of
//positions.
#[derive(Clone, Debug, Default)]
pub struct BrokerLog {
    log: Vec<Trade>,
}

impl BrokerLog {
    pub fn record(&mut self, trade: Trade) {
        self.log.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.log
    }

    pub fn trades_between(&self, start: &DateTime, stop: &DateTime) -> Vec<Trade> {
        self.log
            .iter()
            .filter(|v| v.date >= *start && v.date <= *stop)
            .cloned()
            .collect_vec()
    }

    ///Average price of the trades that opened the current position.
    ///
    ///Trades that add to a position move the average, trades that reduce it leave the average
    ///unchanged, and a trade that reverses the position starts a new average at its own price.
    ///Returns `None` when the position is flat.
    pub fn cost_basis(&self, symbol: &str) -> Option<f64> {
        let mut qty: i64 = 0;
        let mut basis = 0.0;
        for trade in self.log.iter().filter(|t| t.symbol == symbol) {
            let change = trade.signed_quantity();
            let next = qty + change;
            if qty == 0 || qty.signum() == change.signum() {
                let total = basis * qty.abs() as f64 + trade.price * change.abs() as f64;
                basis = total / next.abs() as f64;
            } else if next == 0 {
                basis = 0.0;
            } else if next.signum() != qty.signum() {
                basis = trade.price;
            }
            qty = next;
        }
        if qty == 0 {
            return None;
        }
        Some(basis)
    }
}

impl BrokerLog {
    pub fn new() -> Self {
        BrokerLog { log: Vec::new() }
    }
}

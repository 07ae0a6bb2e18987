//! Surface of the host platform that strategies and the tracker consume.
//!
//! The host owns orders, positions and cash. Everything here is read through snapshots: a call to
//! [GetsOrders::get_order] returns a fresh copy of the order as the host sees it at that moment,
//! nothing is cached between ticks.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::clock::DateTime;
use crate::error::ArgusError;

pub mod calculations;
pub mod record;
pub mod sim;

#[derive(Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    ///Last four characters, enough to tell orders apart in a log window.
    pub fn suffix(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(3)
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.0[start..]
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
}

///Execution style of an order, derived from its optional stop and limit prices.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum OrderStyle {
    Plain,
    Stop(f64),
    Limit(f64),
    StopLimit(f64, f64),
}

impl OrderStyle {
    pub fn from_prices(stop: Option<f64>, limit: Option<f64>) -> Self {
        match (stop, limit) {
            (None, None) => OrderStyle::Plain,
            (Some(stop), None) => OrderStyle::Stop(stop),
            (None, Some(limit)) => OrderStyle::Limit(limit),
            (Some(stop), Some(limit)) => OrderStyle::StopLimit(stop, limit),
        }
    }

    pub fn stop(&self) -> Option<f64> {
        match self {
            OrderStyle::Stop(stop) | OrderStyle::StopLimit(stop, _) => Some(*stop),
            _ => None,
        }
    }

    pub fn limit(&self) -> Option<f64> {
        match self {
            OrderStyle::Limit(limit) | OrderStyle::StopLimit(_, limit) => Some(*limit),
            _ => None,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, OrderStyle::Plain)
    }
}

impl std::fmt::Display for OrderStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStyle::Plain => Ok(()),
            OrderStyle::Stop(stop) => write!(f, "stop {:.2}", stop),
            OrderStyle::Limit(limit) => write!(f, "limit {:.2}", limit),
            OrderStyle::StopLimit(stop, limit) => {
                write!(f, "stop {:.2} limit {:.2}", stop, limit)
            }
        }
    }
}

///Snapshot of an order held by the host.
///
///`amount` is signed, positive for buys and negative for sells. `filled` carries the same sign
///and never exceeds `amount` in magnitude.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub amount: i64,
    pub filled: i64,
    pub status: OrderStatus,
    pub style: OrderStyle,
    pub created: DateTime,
    pub dt: DateTime,
}

impl Order {
    pub fn remaining(&self) -> i64 {
        self.amount - self.filled
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub symbol: String,
    pub amount: i64,
    ///Zero when the host has no basis for the position.
    pub cost_basis: f64,
    pub last_sale_price: f64,
}

///Order that a client wants the host to place.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub qty: i64,
    pub style: OrderStyle,
}

impl OrderRequest {
    pub fn market(symbol: impl Into<String>, qty: i64) -> Self {
        Self {
            symbol: symbol.into(),
            qty,
            style: OrderStyle::Plain,
        }
    }
}

pub trait GetsOrders {
    fn get_order(&self, id: &OrderId) -> Option<Order>;
    ///Open orders of the current day keyed by symbol.
    fn get_open_orders(&self) -> BTreeMap<String, Vec<Order>>;
}

pub trait GetsQuote {
    ///`None` when the symbol cannot currently be traded.
    fn current_price(&self, symbol: &str) -> Option<f64>;

    fn can_trade(&self, symbol: &str) -> bool {
        self.current_price(symbol).is_some()
    }
}

pub trait PositionInfo {
    fn get_position(&self, symbol: &str) -> Option<Position>;
    fn get_positions(&self) -> Vec<String>;

    fn get_position_qty(&self, symbol: &str) -> i64 {
        self.get_position(symbol).map(|p| p.amount).unwrap_or(0)
    }
}

pub trait CashManager {
    fn get_cash_balance(&self) -> f64;
}

pub trait GetsTime {
    fn now(&self) -> DateTime;
}

///Everything the tracker reads from the host in one tick.
pub trait Broker: GetsOrders + GetsQuote + PositionInfo + CashManager + GetsTime {
    ///Cash plus every position marked at the current price, or the last sale when untradeable.
    fn get_liquidation_value(&self) -> f64 {
        let mut value = self.get_cash_balance();
        for symbol in self.get_positions() {
            if let Some(position) = self.get_position(&symbol) {
                let price = self
                    .current_price(&symbol)
                    .unwrap_or(position.last_sale_price);
                value += position.amount as f64 * price;
            }
        }
        value
    }
}

impl<T: GetsOrders + GetsQuote + PositionInfo + CashManager + GetsTime> Broker for T {}

pub trait ReceivesOrders {
    fn send_order(&mut self, order: &OrderRequest) -> Result<OrderId, ArgusError>;

    fn send_orders(&mut self, orders: &[OrderRequest]) -> Result<Vec<OrderId>, ArgusError> {
        orders.iter().map(|order| self.send_order(order)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{OrderId, OrderStyle};

    #[test]
    fn test_that_order_id_suffix_is_last_four_characters() {
        assert_eq!(OrderId::from("00000000001a").suffix(), "001a");
        assert_eq!(OrderId::from("ab").suffix(), "ab");
    }

    #[test]
    fn test_that_style_is_built_from_optional_prices() {
        assert_eq!(OrderStyle::from_prices(None, None), OrderStyle::Plain);
        assert_eq!(
            OrderStyle::from_prices(Some(9.5), Some(9.75)),
            OrderStyle::StopLimit(9.5, 9.75)
        );
        assert_eq!(OrderStyle::from_prices(None, Some(10.0)).limit(), Some(10.0));
        assert_eq!(OrderStyle::from_prices(Some(8.0), None).stop(), Some(8.0));
    }

    #[test]
    fn test_that_styles_format_consistently() {
        assert_eq!(OrderStyle::Plain.to_string(), "");
        assert_eq!(OrderStyle::Stop(9.5).to_string(), "stop 9.50");
        assert_eq!(OrderStyle::Limit(10.0).to_string(), "limit 10.00");
        assert_eq!(
            OrderStyle::StopLimit(9.5, 9.75).to_string(),
            "stop 9.50 limit 9.75"
        );
    }
}

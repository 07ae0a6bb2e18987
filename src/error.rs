use derive_more::{Display, Error};

use crate::broker::OrderId;

#[derive(Debug, Display, Error, PartialEq)]
pub enum ArgusError {
    #[display("order {order_id} is unknown to the broker")]
    UnknownOrder { order_id: OrderId },
    #[display("order {order_id} is no longer open")]
    OrderClosed { order_id: OrderId },
    #[display("order for {qty} {symbol} rejected")]
    InvalidOrder { symbol: String, qty: i64 },
    #[display("fill of {qty} rejected for order {order_id}")]
    InvalidFill { order_id: OrderId, qty: i64 },
    //Untradeable and never held, the host is expected to never present this
    #[display("no tradeable price or position for {symbol}")]
    MissingPrice { symbol: String },
    #[display("invalid date: {value}")]
    InvalidDate { value: String },
    #[display("invalid config: {reason}")]
    InvalidConfig { reason: String },
}

impl From<time::error::ComponentRange> for ArgusError {
    fn from(value: time::error::ComponentRange) -> Self {
        ArgusError::InvalidDate {
            value: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArgusError {
    fn from(value: serde_json::Error) -> Self {
        ArgusError::InvalidConfig {
            reason: value.to_string(),
        }
    }
}

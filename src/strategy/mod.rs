/* A Strategy decides what the portfolio should hold and sends the orders to get there through
the broker. It never touches fills: the broker executes and the tracker reports what happened.

Strategies split their work between a ranking step that runs before the session, fed with
whatever data the strategy screens on, and an update step that runs during the session and
converts target weights into orders.
*/

use std::collections::BTreeMap;

use crate::broker::{Broker, OrderId, ReceivesOrders};
use crate::error::ArgusError;

pub mod earnings;
pub mod fscore;

///Target weight of the liquidation value for each symbol, negative for shorts.
pub type PortfolioAllocation = BTreeMap<String, f64>;

pub trait Strategy {
    ///Runs once per bar. Returns the ids of the orders sent, which may be none.
    fn update<B: Broker + ReceivesOrders>(
        &mut self,
        brkr: &mut B,
    ) -> Result<Vec<OrderId>, ArgusError>;
}

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};

use super::record::{BrokerLog, Trade, TradeType};
use super::{
    CashManager, GetsOrders, GetsQuote, GetsTime, Order, OrderId, OrderRequest, OrderStatus,
    Position, PositionInfo, ReceivesOrders,
};
use crate::clock::{Clock, DateTime};
use crate::error::ArgusError;

pub struct SimBrokerBuilder {
    //Cannot run without a clock
    clock: Option<Clock>,
    cash: f64,
}

impl SimBrokerBuilder {
    pub fn build(&mut self) -> SimBroker {
        let Some(clock) = self.clock.take() else {
            panic!("Cannot build broker without clock");
        };

        SimBroker {
            clock,
            orders: BTreeMap::new(),
            last_id: 0,
            holdings: HashMap::new(),
            prices: HashMap::new(),
            halted: HashSet::new(),
            last_sale: HashMap::new(),
            cash: self.cash,
            log: BrokerLog::new(),
        }
    }

    pub fn with_clock(&mut self, clock: Clock) -> &mut Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_cash(&mut self, cash: f64) -> &mut Self {
        self.cash = cash;
        self
    }

    pub fn new() -> Self {
        Self {
            clock: None,
            cash: 0.0,
        }
    }
}

impl Default for SimBrokerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

///In-memory stand-in for the host platform.
///
///Nothing executes on its own: clients place orders, and the driver of the simulation decides
///when and at what price they fill or cancel. This keeps every transition visible to tests.
#[derive(Clone, Debug)]
pub struct SimBroker {
    clock: Clock,
    orders: BTreeMap<OrderId, Order>,
    last_id: u64,
    holdings: HashMap<String, i64>,
    prices: HashMap<String, f64>,
    halted: HashSet<String>,
    last_sale: HashMap<String, f64>,
    cash: f64,
    log: BrokerLog,
}

impl SimBroker {
    pub fn cost_basis(&self, symbol: &str) -> Option<f64> {
        self.log.cost_basis(symbol)
    }

    pub fn log(&self) -> &BrokerLog {
        &self.log
    }

    pub fn set_price(&mut self, symbol: &str, price: f64) {
        self.halted.remove(symbol);
        self.prices.insert(symbol.to_string(), price);
    }

    ///Symbol stays quoted but cannot be traded until the next [SimBroker::set_price].
    pub fn halt(&mut self, symbol: &str) {
        self.halted.insert(symbol.to_string());
    }

    fn open_order_mut(&mut self, id: &OrderId) -> Result<&mut Order, ArgusError> {
        match self.orders.get_mut(id) {
            None => Err(ArgusError::UnknownOrder {
                order_id: id.clone(),
            }),
            Some(order) if !order.is_open() => Err(ArgusError::OrderClosed {
                order_id: id.clone(),
            }),
            Some(order) => Ok(order),
        }
    }

    ///Executes `qty` shares of the order at `price`.
    ///
    ///`qty` must carry the sign of the order, it is clamped to what remains. The order is marked
    ///filled once nothing remains.
    pub fn fill(&mut self, id: &OrderId, qty: i64, price: f64) -> Result<(), ArgusError> {
        let now = self.clock.now();
        let order = self.open_order_mut(id)?;
        if qty == 0 || qty.signum() != order.amount.signum() {
            return Err(ArgusError::InvalidFill {
                order_id: id.clone(),
                qty,
            });
        }

        let executed = if qty.abs() > order.remaining().abs() {
            order.remaining()
        } else {
            qty
        };
        order.filled += executed;
        order.dt = now;
        if order.filled == order.amount {
            order.status = OrderStatus::Filled;
        }
        let symbol = order.symbol.clone();

        info!(
            "BROKER: Filled {:?} of order {:?} for {:?} at {:?}",
            executed, id, symbol, price
        );

        let holding = self.holdings.entry(symbol.clone()).or_insert(0);
        *holding += executed;
        if *holding == 0 {
            self.holdings.remove(&symbol);
        }
        self.cash -= executed as f64 * price;
        self.last_sale.insert(symbol.clone(), price);
        self.log.record(Trade {
            symbol,
            quantity: executed.abs(),
            price,
            date: now,
            typ: if executed > 0 {
                TradeType::Buy
            } else {
                TradeType::Sell
            },
        });
        Ok(())
    }

    pub fn cancel(&mut self, id: &OrderId) -> Result<(), ArgusError> {
        let now = self.clock.now();
        let order = self.open_order_mut(id)?;
        order.status = OrderStatus::Canceled;
        order.dt = now;
        info!("BROKER: Canceled order {:?}", id);
        Ok(())
    }

    ///Host saw the order on this bar without executing any of it.
    pub fn touch(&mut self, id: &OrderId) -> Result<(), ArgusError> {
        let now = self.clock.now();
        let order = self.open_order_mut(id)?;
        order.dt = now;
        Ok(())
    }
}

impl ReceivesOrders for SimBroker {
    fn send_order(&mut self, order: &OrderRequest) -> Result<OrderId, ArgusError> {
        if order.qty == 0 {
            return Err(ArgusError::InvalidOrder {
                symbol: order.symbol.clone(),
                qty: order.qty,
            });
        }

        self.last_id += 1;
        let id = OrderId::new(format!("{:012x}", self.last_id));
        let now = self.clock.now();
        debug!(
            "BROKER: Received order {:?} for {:?} {:?}",
            id, order.qty, order.symbol
        );
        self.orders.insert(
            id.clone(),
            Order {
                id: id.clone(),
                symbol: order.symbol.clone(),
                amount: order.qty,
                filled: 0,
                status: OrderStatus::Open,
                style: order.style,
                created: now,
                dt: now,
            },
        );
        Ok(id)
    }
}

impl GetsOrders for SimBroker {
    fn get_order(&self, id: &OrderId) -> Option<Order> {
        self.orders.get(id).cloned()
    }

    fn get_open_orders(&self) -> BTreeMap<String, Vec<Order>> {
        let mut open: BTreeMap<String, Vec<Order>> = BTreeMap::new();
        for order in self.orders.values().filter(|o| o.is_open()) {
            open.entry(order.symbol.clone())
                .or_default()
                .push(order.clone());
        }
        open
    }
}

impl GetsQuote for SimBroker {
    fn current_price(&self, symbol: &str) -> Option<f64> {
        if self.halted.contains(symbol) {
            return None;
        }
        self.prices.get(symbol).copied()
    }
}

impl PositionInfo for SimBroker {
    fn get_position(&self, symbol: &str) -> Option<Position> {
        let amount = *self.holdings.get(symbol)?;
        Some(Position {
            symbol: symbol.to_string(),
            amount,
            cost_basis: self.cost_basis(symbol).unwrap_or(0.0),
            last_sale_price: self.last_sale.get(symbol).copied().unwrap_or(0.0),
        })
    }

    fn get_positions(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.holdings.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl CashManager for SimBroker {
    fn get_cash_balance(&self) -> f64 {
        self.cash
    }
}

impl GetsTime for SimBroker {
    fn now(&self) -> DateTime {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::{SimBroker, SimBrokerBuilder};
    use crate::broker::{
        Broker, CashManager, GetsOrders, GetsQuote, OrderRequest, OrderStatus, OrderStyle,
        PositionInfo, ReceivesOrders,
    };
    use crate::clock::{Clock, ClockBuilder, Frequency};
    use crate::error::ArgusError;

    fn setup() -> (SimBroker, Clock) {
        let clock = ClockBuilder::with_length_in_minutes(0, 10).build(Frequency::Minute);
        let mut brkr = SimBrokerBuilder::new()
            .with_clock(clock.clone())
            .with_cash(10_000.0)
            .build();
        brkr.set_price("ABC", 10.0);
        (brkr, clock)
    }

    #[test]
    fn test_that_new_order_is_open_and_unfilled() {
        let (mut brkr, _clock) = setup();
        let id = brkr.send_order(&OrderRequest::market("ABC", 100)).unwrap();
        let order = brkr.get_order(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.filled, 0);
        assert_eq!(order.created, order.dt);
        assert_eq!(brkr.get_open_orders().get("ABC").unwrap().len(), 1);
    }

    #[test]
    fn test_that_partial_fills_accumulate_until_filled() {
        let (mut brkr, clock) = setup();
        let id = brkr.send_order(&OrderRequest::market("ABC", 100)).unwrap();
        clock.tick();
        brkr.fill(&id, 40, 10.0).unwrap();
        let order = brkr.get_order(&id).unwrap();
        assert_eq!(order.filled, 40);
        assert_eq!(order.status, OrderStatus::Open);
        assert_ne!(order.created, order.dt);

        //Clamped to the remaining 60
        brkr.fill(&id, 100, 10.0).unwrap();
        let order = brkr.get_order(&id).unwrap();
        assert_eq!(order.filled, 100);
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(brkr.get_open_orders().is_empty());
        assert_eq!(brkr.get_position_qty("ABC"), 100);
        assert_eq!(brkr.get_cash_balance(), 9_000.0);
    }

    #[test]
    fn test_that_wrong_sign_fill_is_rejected() {
        let (mut brkr, _clock) = setup();
        let id = brkr.send_order(&OrderRequest::market("ABC", -100)).unwrap();
        let res = brkr.fill(&id, 10, 10.0);
        assert!(matches!(res, Err(ArgusError::InvalidFill { .. })));
    }

    #[test]
    fn test_that_closed_orders_cannot_change() {
        let (mut brkr, _clock) = setup();
        let id = brkr.send_order(&OrderRequest::market("ABC", 100)).unwrap();
        brkr.cancel(&id).unwrap();
        assert_eq!(brkr.get_order(&id).unwrap().status, OrderStatus::Canceled);
        assert!(matches!(
            brkr.fill(&id, 10, 10.0),
            Err(ArgusError::OrderClosed { .. })
        ));
        assert!(matches!(
            brkr.cancel(&"ffff".into()),
            Err(ArgusError::UnknownOrder { .. })
        ));
    }

    #[test]
    fn test_that_halted_symbol_has_no_price() {
        let (mut brkr, _clock) = setup();
        brkr.halt("ABC");
        assert!(!brkr.can_trade("ABC"));
        brkr.set_price("ABC", 11.0);
        assert_eq!(brkr.current_price("ABC"), Some(11.0));
    }

    #[test]
    fn test_that_position_reports_cost_basis_and_last_sale() {
        let (mut brkr, _clock) = setup();
        let buy = brkr.send_order(&OrderRequest::market("ABC", 100)).unwrap();
        brkr.fill(&buy, 100, 10.0).unwrap();
        let sell = brkr
            .send_order(&OrderRequest {
                symbol: "ABC".to_string(),
                qty: -40,
                style: OrderStyle::Limit(12.0),
            })
            .unwrap();
        brkr.fill(&sell, -40, 12.0).unwrap();

        let position = brkr.get_position("ABC").unwrap();
        assert_eq!(position.amount, 60);
        assert_eq!(position.cost_basis, 10.0);
        assert_eq!(position.last_sale_price, 12.0);

        brkr.set_price("ABC", 15.0);
        assert_eq!(brkr.get_liquidation_value(), 10_000.0 - 1000.0 + 480.0 + 900.0);
    }

    #[test]
    fn test_that_zero_quantity_order_is_rejected() {
        let (mut brkr, _clock) = setup();
        assert!(brkr.send_order(&OrderRequest::market("ABC", 0)).is_err());
    }
}

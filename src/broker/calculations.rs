use log::{info, warn};

use super::{Broker, OrderRequest};
use crate::strategy::PortfolioAllocation;

///Implements functionality that is standard to most brokers. Brokers do not necessarily need to
///use this logic but it represents functionality common to the strategies that we run now.
pub struct BrokerCalculations;

impl BrokerCalculations {
    ///Orders that move each symbol in `target_weights` to its share of the liquidation value.
    ///
    ///Quantities are whole shares, rounded towards zero, positive for buys and negative for sells.
    ///Symbols that cannot be traded right now are skipped. Sells come before buys so that cash is
    ///raised before it is spent.
    pub fn diff_against_target_weights(
        target_weights: &PortfolioAllocation,
        brkr: &impl Broker,
    ) -> Vec<OrderRequest> {
        info!("STRATEGY: Calculating diff of current allocation vs. target");
        let total_value = brkr.get_liquidation_value();
        if total_value <= 0.0 {
            warn!("STRATEGY: Portfolio has no value to allocate, skipping rebalance");
            return Vec::new();
        }

        let mut buy_orders: Vec<OrderRequest> = Vec::new();
        let mut sell_orders: Vec<OrderRequest> = Vec::new();

        for (symbol, weight) in target_weights {
            //We do not throw an error here, untradeable symbols are picked up on a later rebalance
            let Some(price) = brkr.current_price(symbol) else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }

            let curr_val = brkr.get_position_qty(symbol) as f64 * price;
            let target_val = total_value * weight;
            let required_shares = ((target_val - curr_val) / price).trunc() as i64;

            if required_shares > 0 {
                buy_orders.push(OrderRequest::market(symbol.clone(), required_shares));
            } else if required_shares < 0 {
                sell_orders.push(OrderRequest::market(symbol.clone(), required_shares));
            }
        }

        let mut orders = sell_orders;
        orders.extend(buy_orders);
        orders
    }
}

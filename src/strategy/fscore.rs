use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use super::{PortfolioAllocation, Strategy};
use crate::broker::calculations::BrokerCalculations;
use crate::broker::{Broker, OrderId, ReceivesOrders};
use crate::clock::{DateTime, Session};
use crate::error::ArgusError;
use crate::schedule::LastBusinessDayTradingSchedule;

///Lowest score that passes the screen.
pub const MIN_SCORE: u8 = 7;
///Most names held at once.
pub const MAX_HOLDINGS: usize = 10;

///One observation of the fundamentals that the score is built from.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Fundamentals {
    pub roa: f64,
    pub operating_cash_flow: f64,
    pub cash_flow_from_ops: f64,
    pub long_term_debt_equity: f64,
    pub current_ratio: f64,
    pub shares_outstanding: f64,
    pub gross_margin: f64,
    pub assets_turnover: f64,
}

///Oldest and latest observation over the lookback.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FundamentalWindow {
    pub first: Fundamentals,
    pub last: Fundamentals,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PiotroskiScore {
    pub profitability: u8,
    pub leverage: u8,
    pub operating: u8,
}

impl PiotroskiScore {
    pub fn total(&self) -> u8 {
        self.profitability + self.leverage + self.operating
    }
}

impl From<&FundamentalWindow> for PiotroskiScore {
    fn from(window: &FundamentalWindow) -> Self {
        let first = &window.first;
        let last = &window.last;
        let count = |tests: &[bool]| tests.iter().filter(|passed| **passed).count() as u8;

        Self {
            profitability: count(&[
                last.roa > 0.0,
                last.operating_cash_flow > 0.0,
                last.roa > first.roa,
                last.cash_flow_from_ops > last.roa,
            ]),
            leverage: count(&[
                last.long_term_debt_equity < first.long_term_debt_equity,
                last.current_ratio > first.current_ratio,
                last.shares_outstanding <= first.shares_outstanding,
            ]),
            operating: count(&[
                last.gross_margin > first.gross_margin,
                last.assets_turnover > first.assets_turnover,
            ]),
        }
    }
}

///Screens on [MIN_SCORE] and weights the top [MAX_HOLDINGS] by their share of the summed score.
///
///Ties are broken by symbol so the selection does not depend on map order.
pub fn rank(windows: &HashMap<String, FundamentalWindow>) -> PortfolioAllocation {
    let mut scored: Vec<(&String, u8)> = windows
        .iter()
        .map(|(symbol, window)| (symbol, PiotroskiScore::from(window).total()))
        .filter(|(_, score)| *score >= MIN_SCORE)
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.truncate(MAX_HOLDINGS);

    let total: u32 = scored.iter().map(|(_, score)| u32::from(*score)).sum();
    scored
        .into_iter()
        .map(|(symbol, score)| (symbol.clone(), f64::from(score) / f64::from(total)))
        .collect()
}

///Holds the highest scoring names, rebalanced once a month.
///
///Ranking happens before the session on the last business day of the month, the trade goes out on
///the next [Strategy::update]. Held names that drop out of the selection are sold.
#[derive(Debug, Default)]
pub struct FScoreStrategy {
    is_month_end: bool,
    selection: PortfolioAllocation,
    session: Session,
}

impl FScoreStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    ///Month ends are judged on the exchange-local date of this session.
    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn is_month_end(&self) -> bool {
        self.is_month_end
    }

    pub fn selection(&self) -> &PortfolioAllocation {
        &self.selection
    }

    pub fn before_trading_start(
        &mut self,
        now: &DateTime,
        windows: &HashMap<String, FundamentalWindow>,
    ) -> Result<(), ArgusError> {
        let today = self.session.local_date(*now)?;
        if !LastBusinessDayTradingSchedule::is_last_business_day(today) {
            return Ok(());
        }
        self.selection = rank(windows);
        self.is_month_end = true;
        info!(
            "STRATEGY: Month end selection of {:?} names from {:?} candidates",
            self.selection.len(),
            windows.len()
        );
        Ok(())
    }
}

impl Strategy for FScoreStrategy {
    fn update<B: Broker + ReceivesOrders>(
        &mut self,
        brkr: &mut B,
    ) -> Result<Vec<OrderId>, ArgusError> {
        if !self.is_month_end {
            return Ok(Vec::new());
        }

        let mut target = PortfolioAllocation::new();
        for (symbol, weight) in &self.selection {
            if brkr.can_trade(symbol) {
                target.insert(symbol.clone(), *weight);
            }
        }
        for symbol in brkr.get_positions() {
            target.entry(symbol).or_insert(0.0);
        }

        let orders = BrokerCalculations::diff_against_target_weights(&target, &*brkr);
        let ids = brkr.send_orders(&orders)?;
        self.is_month_end = false;
        Ok(ids)
    }
}

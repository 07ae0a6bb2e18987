use std::fmt::{Display, Formatter};

use crate::broker::{OrderId, OrderStyle};

//Width that the order part of a line is padded to, so cash and ids line up in the log window
const LINE_WIDTH: usize = 52;

///How much of an order a fill line reports.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillAmount {
    ///Whole order filled on one bar.
    Whole { amount: i64 },
    ///Final fill of an order that was already partially filled.
    Rest { filled: i64, amount: i64 },
    ///Fill that leaves the order open.
    Partial { filled: i64, amount: i64 },
}

impl Display for FillAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FillAmount::Whole { amount } => write!(f, "{}", amount),
            FillAmount::Rest { filled, amount } => write!(f, "all {}/{}", filled, amount),
            FillAmount::Partial { filled, amount } => write!(f, "{}/{}", filled, amount),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ActivityKind {
    Placed {
        position: i64,
    },
    Filled {
        fill: FillAmount,
        delta: i64,
        position: i64,
        pnl: Option<f64>,
    },
    Canceled,
    Unfilled,
}

///One change in an order seen by the tracker, rendered as a single log line by [Display].
#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    pub minute: i64,
    pub order_id: OrderId,
    pub symbol: String,
    ///Requested quantity of the order, signed.
    pub amount: i64,
    pub price: f64,
    pub style: OrderStyle,
    pub cash: Option<i64>,
    pub show_id: bool,
    pub kind: ActivityKind,
}

impl Activity {
    ///Shares executed since the previous report, zero for anything but fills.
    pub fn delta(&self) -> i64 {
        match self.kind {
            ActivityKind::Filled { delta, .. } => delta,
            _ => 0,
        }
    }

    fn side(&self) -> &'static str {
        if self.amount > 0 {
            "Buy"
        } else {
            "Sell"
        }
    }

    fn style_suffix(&self) -> String {
        if self.style.is_plain() {
            String::new()
        } else {
            format!(" {}", self.style)
        }
    }

    fn id_suffix(&self) -> &str {
        if self.show_id {
            self.order_id.suffix()
        } else {
            ""
        }
    }

    fn cash_suffix(&self) -> String {
        match self.cash {
            Some(cash) => format!("cash {}", cash),
            None => String::new(),
        }
    }

    fn position_marker(position: i64) -> String {
        if position != 0 {
            format!(" ({})", position)
        } else {
            " _".to_string()
        }
    }

    fn pad(&self, head: String) -> String {
        format!(
            "{:<width$}  {}  {}",
            head,
            self.cash_suffix(),
            self.id_suffix(),
            width = LINE_WIDTH
        )
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let line = match &self.kind {
            ActivityKind::Placed { position } => self.pad(format!(
                " {:>3}   {} {} {}{} at {:.2}{}",
                self.minute,
                self.side(),
                self.amount,
                self.symbol,
                Self::position_marker(*position),
                self.price,
                self.style_suffix()
            )),
            ActivityKind::Filled {
                fill,
                position,
                pnl,
                ..
            } => {
                let pnl = match pnl {
                    Some(pnl) => format!("  ({:+.0})", pnl),
                    None => String::new(),
                };
                self.pad(format!(
                    " {:>3}      {} {} {}{} at {:.2}{}{}",
                    self.minute,
                    if self.amount > 0 { "Bot" } else { "Sold" },
                    fill,
                    self.symbol,
                    Self::position_marker(*position),
                    self.price,
                    pnl,
                    self.style_suffix()
                ))
            }
            ActivityKind::Canceled => self.pad(format!(
                " {:>3}     Canceled {} {} {}{} at {:.2}",
                self.minute,
                self.side(),
                self.amount,
                self.symbol,
                self.style_suffix(),
                self.price
            )),
            ActivityKind::Unfilled => format!(
                " {:>3}         {} {} unfilled  {}",
                self.minute,
                self.symbol,
                self.amount,
                self.id_suffix()
            ),
        };
        write!(f, "{}", line.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityKind, FillAmount};
    use crate::broker::{OrderId, OrderStyle};

    fn activity(kind: ActivityKind) -> Activity {
        Activity {
            minute: 5,
            order_id: OrderId::from("00000000001a"),
            symbol: "ABC".to_string(),
            amount: -100,
            price: 12.0,
            style: OrderStyle::Plain,
            cash: None,
            show_id: false,
            kind,
        }
    }

    #[test]
    fn test_that_fill_amounts_render() {
        assert_eq!(FillAmount::Whole { amount: -100 }.to_string(), "-100");
        assert_eq!(
            FillAmount::Rest {
                filled: 60,
                amount: 100
            }
            .to_string(),
            "all 60/100"
        );
        assert_eq!(
            FillAmount::Partial {
                filled: -40,
                amount: -100
            }
            .to_string(),
            "-40/-100"
        );
    }

    #[test]
    fn test_that_fill_line_shows_signed_pnl() {
        let line = activity(ActivityKind::Filled {
            fill: FillAmount::Partial {
                filled: -40,
                amount: -100,
            },
            delta: -40,
            position: 60,
            pnl: Some(80.0),
        })
        .to_string();
        assert_eq!(line, "   5      Sold -40/-100 ABC (60) at 12.00  (+80)");
    }

    #[test]
    fn test_that_negative_pnl_keeps_its_sign() {
        let line = activity(ActivityKind::Filled {
            fill: FillAmount::Whole { amount: -100 },
            delta: -100,
            position: 0,
            pnl: Some(-150.4),
        })
        .to_string();
        assert_eq!(line, "   5      Sold -100 ABC _ at 12.00  (-150)");
    }

    #[test]
    fn test_that_placed_line_is_padded_before_suffix() {
        let mut placed = activity(ActivityKind::Placed { position: 0 });
        placed.amount = 100;
        placed.style = OrderStyle::Limit(11.5);
        placed.cash = Some(-250);
        placed.show_id = true;
        let head = "   5   Buy 100 ABC _ at 12.00 limit 11.50";
        let expected = format!("{:<52}  cash -250  001a", head);
        assert_eq!(placed.to_string(), expected);
    }

    #[test]
    fn test_that_canceled_line_formats_stop_limit() {
        let mut canceled = activity(ActivityKind::Canceled);
        canceled.style = OrderStyle::StopLimit(11.0, 10.5);
        assert_eq!(
            canceled.to_string(),
            "   5     Canceled Sell -100 ABC stop 11.00 limit 10.50 at 12.00"
        );
    }

    #[test]
    fn test_that_unfilled_line_has_id_only() {
        let mut unfilled = activity(ActivityKind::Unfilled);
        unfilled.show_id = true;
        unfilled.cash = Some(-5);
        assert_eq!(
            unfilled.to_string(),
            "   5         ABC -100 unfilled  001a"
        );
    }

    #[test]
    fn test_that_delta_is_zero_outside_fills() {
        assert_eq!(activity(ActivityKind::Canceled).delta(), 0);
    }
}

use time::{macros::format_description, Date, Weekday};

use crate::clock::{DateTime, Session};
use crate::error::ArgusError;

pub trait TradingSchedule {
    fn should_trade(date: &DateTime) -> bool;
}

///Trades on the last weekday of each month, judged by the exchange-local date.
pub struct LastBusinessDayTradingSchedule;

impl LastBusinessDayTradingSchedule {
    pub fn is_last_business_day(date: Date) -> bool {
        if let Weekday::Saturday | Weekday::Sunday = date.weekday() {
            return false;
        }
        //Skip the weekend, the next weekday must be in a different month
        let mut next = date;
        while let Some(day) = next.next_day() {
            next = day;
            match next.weekday() {
                Weekday::Saturday | Weekday::Sunday => continue,
                _ => return next.month() != date.month(),
            }
        }
        true
    }
}

impl TradingSchedule for LastBusinessDayTradingSchedule {
    fn should_trade(date: &DateTime) -> bool {
        match Session::default().local_date(*date) {
            Ok(local) => Self::is_last_business_day(local),
            Err(_) => false,
        }
    }
}

pub fn parse_date(value: &str) -> Result<Date, ArgusError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, format).map_err(|_| ArgusError::InvalidDate {
        value: value.to_string(),
    })
}

///Switches activity on and off on given dates, so that long runs can be logged selectively.
///
///With no dates given the window is always active. Otherwise it starts inactive, a date in `start`
///turns it on and a date in `stop` turns it off; other dates keep the last state.
#[derive(Clone, Debug, Default)]
pub struct ActivityWindow {
    start: Vec<Date>,
    stop: Vec<Date>,
    active: bool,
}

impl ActivityWindow {
    pub fn new(start: &[String], stop: &[String]) -> Result<Self, ArgusError> {
        let start = start
            .iter()
            .map(|v| parse_date(v))
            .collect::<Result<Vec<Date>, ArgusError>>()?;
        let stop = stop
            .iter()
            .map(|v| parse_date(v))
            .collect::<Result<Vec<Date>, ArgusError>>()?;
        Ok(Self {
            start,
            stop,
            active: false,
        })
    }

    pub fn always() -> Self {
        Self::default()
    }

    pub fn update(&mut self, today: Date) -> bool {
        if self.start.is_empty() && self.stop.is_empty() {
            self.active = true;
        } else if self.start.contains(&today) {
            self.active = true;
        } else if self.stop.contains(&today) {
            self.active = false;
        }
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

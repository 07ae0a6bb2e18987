//! Synchronizes time across components and converts it into exchange-local time.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;
use std::vec::IntoIter;

use chrono::{Offset, TimeZone};
use serde::{Deserialize, Serialize};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::ArgusError;

///The frequency of a process.
#[derive(Clone, Debug)]
pub enum Frequency {
    Second,
    Minute,
    Daily,
}

impl Frequency {
    fn step(&self) -> i64 {
        match self {
            Frequency::Second => 1,
            Frequency::Minute => 60,
            Frequency::Daily => 86_400,
        }
    }
}

///[DateTime] is a wrapper around the epoch time as i64.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Copy, Ord, Deserialize, Serialize)]
pub struct DateTime(i64);

impl Deref for DateTime {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime> for i64 {
    fn from(v: DateTime) -> Self {
        v.0
    }
}

impl From<i64> for DateTime {
    fn from(v: i64) -> Self {
        DateTime(v)
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        value.unix_timestamp().into()
    }
}

impl TryFrom<DateTime> for OffsetDateTime {
    type Error = ArgusError;

    fn try_from(value: DateTime) -> Result<Self, Self::Error> {
        Ok(OffsetDateTime::from_unix_timestamp(value.0)?)
    }
}

#[doc(hidden)]
#[derive(Debug)]
pub struct ClockInner {
    //We have a position and Vec because we should be able to return an iterator without changing
    //the state of the Clock
    pos: usize,
    dates: Vec<DateTime>,
}

///Clock is a reference to the internal clock used by all components that have a dependency on the
///date within the backtest.
///
///Components are driven from a single call path, one tick at a time, so the clock is shared with
///[Rc] rather than a lock.
#[derive(Clone, Debug)]
pub struct Clock {
    inner: Rc<RefCell<ClockInner>>,
}

impl Clock {
    pub fn now(&self) -> DateTime {
        let inner = self.inner.borrow();
        //Position is checked on tick so this is always in range
        inner.dates[inner.pos]
    }

    pub fn has_next(&self) -> bool {
        let inner = self.inner.borrow();
        inner.pos + 1 < inner.dates.len()
    }

    pub fn tick(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.pos += 1;
        if inner.pos >= inner.dates.len() {
            panic!("Client has ticked past the number of dates");
        }
    }

    //Doesn't change the iteration state, used for clients to setup data using clock
    pub fn peek(&self) -> IntoIter<DateTime> {
        self.inner.borrow().dates.clone().into_iter()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().dates.is_empty()
    }

    pub fn new(mut dates: Vec<DateTime>) -> Self {
        dates.sort();
        dates.dedup();
        if dates.is_empty() {
            panic!("Cannot build clock without dates");
        }
        Self {
            inner: Rc::new(RefCell::new(ClockInner { dates, pos: 0 })),
        }
    }
}

/// Used to build [Clock].
pub struct ClockBuilder {
    pub start: DateTime,
    pub end: DateTime,
}

impl ClockBuilder {
    pub fn build(self, freq: Frequency) -> Clock {
        let dates: Vec<DateTime> = (i64::from(self.start)..i64::from(self.end) + 1)
            .step_by(freq.step() as usize)
            .map(DateTime::from)
            .collect();
        Clock::new(dates)
    }

    //Runs for length given + 1 period
    pub fn with_length_in_seconds(start: impl Into<DateTime>, length_in_seconds: i64) -> Self {
        let start = start.into();
        Self {
            start,
            end: DateTime::from(*start + length_in_seconds),
        }
    }

    //Runs for length given + 1 period
    pub fn with_length_in_minutes(start: impl Into<DateTime>, length_in_minutes: i64) -> Self {
        Self::with_length_in_seconds(start, length_in_minutes * 60)
    }

    //Runs for length given + 1 period
    pub fn with_length_in_days(start: impl Into<DateTime>, length_in_days: i64) -> Self {
        Self::with_length_in_seconds(start, length_in_days * 86_400)
    }
}

///Timezone that the exchange quotes its session in.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum ExchangeTimezone {
    ///America/New_York, with the daylight saving rules in force at each date.
    UsEastern,
    ///Any zone in the tz database, e.g. "Europe/London".
    Named(String),
    ///Fixed offset from UTC in minutes.
    Fixed(i32),
}

fn parse_zone(name: &str) -> Result<Tz, ArgusError> {
    name.parse::<Tz>().map_err(|_| ArgusError::InvalidConfig {
        reason: format!("unknown timezone {}", name),
    })
}

fn zone_offset(zone: Tz, utc: OffsetDateTime) -> Result<i32, ArgusError> {
    let Some(instant) = chrono::DateTime::from_timestamp(utc.unix_timestamp(), 0) else {
        return Err(ArgusError::InvalidDate {
            value: utc.unix_timestamp().to_string(),
        });
    };
    Ok(zone
        .offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc())
}

impl ExchangeTimezone {
    ///Fails on names missing from the tz database.
    pub fn validate(&self) -> Result<(), ArgusError> {
        match self {
            ExchangeTimezone::Named(name) => parse_zone(name).map(|_| ()),
            _ => Ok(()),
        }
    }

    fn offset_at(&self, utc: OffsetDateTime) -> Result<UtcOffset, ArgusError> {
        let seconds = match self {
            ExchangeTimezone::UsEastern => zone_offset(New_York, utc)?,
            ExchangeTimezone::Named(name) => zone_offset(parse_zone(name)?, utc)?,
            ExchangeTimezone::Fixed(minutes) => minutes * 60,
        };
        Ok(UtcOffset::from_whole_seconds(seconds)?)
    }

    pub fn to_local(&self, date: DateTime) -> Result<OffsetDateTime, ArgusError> {
        let utc = OffsetDateTime::try_from(date)?;
        Ok(utc.to_offset(self.offset_at(utc)?))
    }
}

///Trading session of the exchange: where it is and when the first bar of the day prints.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Session {
    pub timezone: ExchangeTimezone,
    ///Local (hour, minute) of the first bar, counted as minute zero.
    pub first_bar: (u8, u8),
}

impl Default for Session {
    fn default() -> Self {
        Self {
            timezone: ExchangeTimezone::UsEastern,
            first_bar: (9, 31),
        }
    }
}

impl Session {
    ///Minutes elapsed since the first bar of the session, negative before it.
    pub fn minute(&self, now: DateTime) -> Result<i64, ArgusError> {
        let local = self.timezone.to_local(now)?;
        let (hour, minute) = self.first_bar;
        let elapsed = i64::from(local.hour()) * 60 + i64::from(local.minute());
        Ok(elapsed - (i64::from(hour) * 60 + i64::from(minute)))
    }

    pub fn local_date(&self, now: DateTime) -> Result<Date, ArgusError> {
        Ok(self.timezone.to_local(now)?.date())
    }
}

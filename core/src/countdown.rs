//! Yearly recurrence and countdown arithmetic for the birthday pages.
//!
//! Everything runs in the timezone of the `DateTime` passed in, which is the
//! client's local zone in production (`Clock::local`). No normalization is
//! attempted, so two clients in different zones see the trigger at different
//! instants.

use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone};
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// A month/day pair that repeats every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MonthDay")]
pub struct RecurringDate {
    month: u32,
    day: u32,
}

/// Unchecked wire form of [`RecurringDate`].
#[derive(Deserialize)]
struct MonthDay {
    month: u32,
    day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{month:02}-{day:02} is not a day of any year")]
pub struct InvalidMonthDay {
    pub month: u32,
    pub day: u32,
}

impl TryFrom<MonthDay> for RecurringDate {
    type Error = InvalidMonthDay;

    fn try_from(raw: MonthDay) -> Result<Self, Self::Error> {
        RecurringDate::new(raw.month, raw.day).ok_or(InvalidMonthDay {
            month: raw.month,
            day: raw.day,
        })
    }
}

impl RecurringDate {
    /// `None` unless the pair exists in some year; Feb 29 is accepted.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// The month/day of a full date, e.g. a date of birth.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// True when `now` falls on this month and day, whatever the year.
    pub fn is_today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        now.month() == self.month && now.day() == self.day
    }

    /// Local midnight of this month/day in `year`.
    ///
    /// A day the month does not have (Feb 29 outside leap years) rolls over
    /// into the next month, giving March 1.
    pub fn occurrence_in<Tz: TimeZone>(&self, tz: &Tz, year: i32) -> Option<DateTime<Tz>> {
        calendar_date(year, self.month, self.day).and_then(|date| local_midnight(tz, date))
    }

    /// The first occurrence at or after `now`.
    pub fn next_occurrence<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        match self.occurrence_in(&tz, now.year()) {
            Some(candidate) if candidate >= *now => candidate,
            _ => self
                .occurrence_in(&tz, now.year() + 1)
                .unwrap_or_else(|| now.clone()),
        }
    }

    pub fn time_remaining<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Countdown {
        let next = self.next_occurrence(now);
        Countdown::from_millis(next.signed_duration_since(now.clone()).num_milliseconds())
    }

    /// What the birthday page should show at `now`.
    pub fn phase<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Phase {
        if self.is_today(now) {
            Phase::Today
        } else {
            Phase::Counting(self.time_remaining(now))
        }
    }
}

impl fmt::Display for RecurringDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Parses a full `YYYY-MM-DD` date and keeps its month/day.
impl FromStr for RecurringDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self::from_date)
    }
}

fn calendar_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
        NaiveDate::from_ymd_opt(year, month, 1)?
            .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
    })
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight).earliest().or_else(|| {
        // Midnight skipped by a DST jump: use the first hour that exists.
        tz.from_local_datetime(&(midnight + TimeDelta::hours(1)))
            .earliest()
    })
}

/// Whole days, hours, minutes and seconds left, each floored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    pub const ZERO: Countdown = Countdown {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Decompose a millisecond span. Non-positive spans are zero.
    pub fn from_millis(ms: i64) -> Self {
        if ms <= 0 {
            return Self::ZERO;
        }
        Self {
            days: ms / MS_PER_DAY,
            hours: (ms / MS_PER_HOUR) % 24,
            minutes: (ms / MS_PER_MINUTE) % 60,
            seconds: (ms / MS_PER_SECOND) % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn total_seconds(&self) -> i64 {
        ((self.days * 24 + self.hours) * 60 + self.minutes) * 60 + self.seconds
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The target month/day is today: celebrate.
    Today,
    Counting(Countdown),
}

/// Recomputes the phase of a target on a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    target: RecurringDate,
    period: Duration,
}

impl Ticker {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

    pub fn new(target: RecurringDate) -> Self {
        Self {
            target,
            period: Self::DEFAULT_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Call `on_tick` with a fresh phase every period until the target day
    /// arrives or the observer breaks. Returns the last phase computed.
    ///
    /// Ticks run back to back on the calling thread; a slow observer delays
    /// the next tick rather than queueing extra ones.
    pub fn run<C, F>(&self, clock: &C, mut on_tick: F) -> Phase
    where
        C: Clock + ?Sized,
        F: FnMut(&Phase) -> ControlFlow<()>,
    {
        loop {
            let phase = self.target.phase(&clock.local());
            let flow = on_tick(&phase);
            if phase == Phase::Today || flow.is_break() {
                return phase;
            }
            thread::sleep(self.period);
        }
    }

    /// [`Ticker::run`] against the system clock.
    pub fn run_local<F>(&self, on_tick: F) -> Phase
    where
        F: FnMut(&Phase) -> ControlFlow<()>,
    {
        self.run(&DefaultClock, on_tick)
    }
}

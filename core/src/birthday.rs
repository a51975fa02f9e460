//! Birthday directory helpers built on the user list and `countdown`.

use chrono::{DateTime, TimeZone};

use crate::countdown::{Phase, RecurringDate};
use crate::types::User;

impl User {
    /// Recurrence target taken from the date of birth, if one is set.
    pub fn birthday(&self) -> Option<RecurringDate> {
        self.dob.map(RecurringDate::from_date)
    }

    /// Celebration or countdown for this user at `now`; `None` without a
    /// date of birth.
    pub fn birthday_phase<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<Phase> {
        self.birthday().map(|target| target.phase(now))
    }
}

/// Users offered on the birthday picker: only those with a date of birth.
pub fn with_birthdays(users: &[User]) -> Vec<&User> {
    users.iter().filter(|user| user.dob.is_some()).collect()
}

/// Users whose birthday is today, in list order.
pub fn celebrating_today<'a, Tz: TimeZone>(users: &'a [User], now: &DateTime<Tz>) -> Vec<&'a User> {
    users
        .iter()
        .filter(|user| user.birthday_phase(now) == Some(Phase::Today))
        .collect()
}

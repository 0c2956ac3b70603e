use std::fmt::Debug;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;

/// A wall-clock snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateTime {
    /// Full year, e.g: 2020
    pub year: u16,
    /// 1..=12
    pub month: u8,
    /// 1..=31
    pub day: u8,
    /// 0..=23
    pub hour: u8,
    /// 0..=59
    pub minute: u8,
    /// 0..=59
    pub second: u8,
    /// 0..=6, Monday is 0
    pub weekday: u8,
}

impl DateTime {
    pub fn from_naive(t: &NaiveDateTime) -> DateTime {
        DateTime {
            year: t.year() as u16,
            month: t.month() as u8,
            day: t.day() as u8,
            hour: t.hour() as u8,
            minute: t.minute() as u8,
            second: t.second() as u8,
            weekday: t.weekday().num_days_from_monday() as u8,
        }
    }

    /// Convert into a chrono timestamp. The weekday field is ignored, as it is
    /// implied by the date.
    ///
    /// Out-of-range fields roll over into the next larger one (e.g: February
    /// 30th is March 2nd, month 0 is December of the previous year). Returns
    /// `None` only if the result doesn't fit in a `NaiveDateTime`.
    pub fn normalized(&self) -> Option<NaiveDateTime> {
        let months = self.year as i32 * 12 + self.month as i32 - 1;
        let first =
            NaiveDate::from_ymd_opt(months.div_euclid(12), months.rem_euclid(12) as u32 + 1, 1)?;

        let offset = Duration::days(self.day as i64 - 1)
            + Duration::hours(self.hour as i64)
            + Duration::minutes(self.minute as i64)
            + Duration::seconds(self.second as i64);
        first.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)
    }
}

#[derive(Debug, Error)]
#[error("clock rejected {0:?}")]
pub struct ClockError(pub DateTime);

/// A real-time clock. Only supports atomic get/set of the whole snapshot.
pub trait Clock: Debug {
    fn datetime(&mut self) -> DateTime;
    fn set_datetime(&mut self, t: DateTime) -> Result<(), ClockError>;
}

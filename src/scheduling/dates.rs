//! Date and time-of-day primitives shared by slot generation and plan scheduling

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};

use crate::error::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Parse a `YYYY-MM-DD` date, naming the offending field on failure
pub fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("Invalid {} (use YYYY-MM-DD)", field)))
}

/// Parse a `HH:MM` (or `HH:MM:SS`) time of day
pub fn parse_time(value: &str, field: &str) -> AppResult<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid {} (use HH:MM)", field)))
}

/// Parse an optional date field, rejecting malformed values instead of ignoring them
pub fn parse_optional_date(value: Option<&str>, field: &str) -> AppResult<Option<NaiveDate>> {
    value.map(|v| parse_date(v, field)).transpose()
}

/// Day of week with 0 = Monday and 6 = Sunday
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Monday of the week containing `date`
pub fn week_anchor(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(weekday_index(date)))
}

/// Key used for dates in plan schedules
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn minutes_of_day(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}

/// Inverse of [`minutes_of_day`]; `None` outside a single day
pub fn time_from_minutes(minutes: i32) -> Option<NaiveTime> {
    if !(0..MINUTES_PER_DAY).contains(&minutes) {
        return None;
    }
    NaiveTime::from_hms_opt((minutes / 60) as u32, (minutes % 60) as u32, 0)
}

/// Inclusive iterator over a date range
pub fn days_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

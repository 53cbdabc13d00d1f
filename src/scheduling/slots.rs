//! Bookable slot generation
//!
//! Slots are derived on demand from a calendar's weekly windows, the coach's
//! blocked times and the calendar's existing bookings. Nothing here touches the
//! clock: callers pass `now` so that notice windows are evaluated at request time.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use super::{
    booking::{find_conflict, BookedInterval},
    dates::{days_between, time_from_minutes, weekday_index},
};
use crate::error::{AppError, AppResult};

/// Calendar booking policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    pub slot_duration_minutes: i32,
    pub buffer_minutes: i32,
    pub max_advance_days: i32,
    pub min_notice_hours: i32,
}

impl SlotPolicy {
    pub fn validate(&self) -> AppResult<()> {
        if self.slot_duration_minutes <= 0 {
            return Err(AppError::Validation("Slot duration must be positive".to_string()));
        }
        if self.buffer_minutes < 0 {
            return Err(AppError::Validation("Buffer cannot be negative".to_string()));
        }
        if self.max_advance_days < 0 || self.min_notice_hours < 0 {
            return Err(AppError::Validation(
                "Advance and notice windows cannot be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn step(&self) -> i32 {
        self.slot_duration_minutes + self.buffer_minutes
    }
}

/// A recurring availability window, in minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyWindow {
    pub day_of_week: u8,
    pub start_minute: i32,
    pub end_minute: i32,
}

/// Blocked time on a single date; `span` is `None` for a whole day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBlock {
    pub date: NaiveDate,
    pub span: Option<(i32, i32)>,
}

/// A candidate bookable slot (never persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
}

/// The range in which slots may start, evaluated against the current moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub earliest_start: NaiveDateTime,
    pub last_date: NaiveDate,
}

impl BookingWindow {
    pub fn new(policy: &SlotPolicy, now: NaiveDateTime) -> Self {
        Self {
            earliest_start: now + Duration::hours(i64::from(policy.min_notice_hours)),
            last_date: now.date() + Duration::days(i64::from(policy.max_advance_days)),
        }
    }

    pub fn admits(&self, start: NaiveDateTime) -> bool {
        start >= self.earliest_start && start.date() <= self.last_date
    }

    /// Clip a requested date range; `None` when nothing remains
    pub fn clip(&self, from: NaiveDate, to: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = from.max(self.earliest_start.date());
        let to = to.min(self.last_date);
        (from <= to).then_some((from, to))
    }
}

/// Remove every `cuts` interval from `base`, returning the sorted remainder
pub fn subtract_intervals(base: (i32, i32), cuts: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let mut free = vec![base];
    for &(cut_start, cut_end) in cuts {
        free = free
            .into_iter()
            .flat_map(|(start, end)| {
                if cut_end <= start || cut_start >= end {
                    return vec![(start, end)];
                }
                let mut pieces = Vec::with_capacity(2);
                if cut_start > start {
                    pieces.push((start, cut_start));
                }
                if cut_end < end {
                    pieces.push((cut_end, end));
                }
                pieces
            })
            .collect();
    }
    free
}

/// Generate the bookable slots in `[from, to]`, ordered by date then start time.
///
/// `booked` must only contain non-cancelled bookings of the same calendar.
pub fn generate_slots(
    policy: &SlotPolicy,
    windows: &[WeeklyWindow],
    blocks: &[DateBlock],
    booked: &[BookedInterval],
    from: NaiveDate,
    to: NaiveDate,
    now: NaiveDateTime,
) -> Vec<Slot> {
    if policy.validate().is_err() {
        return Vec::new();
    }

    let window = BookingWindow::new(policy, now);
    let Some((from, to)) = window.clip(from, to) else {
        return Vec::new();
    };

    let duration = policy.slot_duration_minutes;
    // Keyed by (date, start minute): dedups overlapping windows and keeps order
    let mut candidates: BTreeSet<(NaiveDate, i32)> = BTreeSet::new();

    for date in days_between(from, to) {
        let day_blocks: Vec<&DateBlock> = blocks.iter().filter(|b| b.date == date).collect();
        if day_blocks.iter().any(|b| b.span.is_none()) {
            continue;
        }
        let cuts: Vec<(i32, i32)> = day_blocks.iter().filter_map(|b| b.span).collect();
        let weekday = weekday_index(date);

        for w in windows.iter().filter(|w| w.day_of_week == weekday) {
            let free = subtract_intervals((w.start_minute, w.end_minute), &cuts);
            let mut start = w.start_minute;
            while start + duration <= w.end_minute {
                let fits = free.iter().any(|&(fs, fe)| fs <= start && start + duration <= fe);
                let admitted = time_from_minutes(start)
                    .map(|t| window.admits(date.and_time(t)))
                    .unwrap_or(false);
                if fits && admitted {
                    candidates.insert((date, start));
                }
                start += policy.step();
            }
        }
    }

    candidates
        .into_iter()
        .filter(|&(date, start)| {
            let interval = BookedInterval {
                date,
                start_minute: start,
                duration_minutes: duration,
            };
            find_conflict(&interval, booked).is_none()
        })
        .filter_map(|(date, start)| {
            time_from_minutes(start).map(|time| Slot {
                date,
                time,
                duration_minutes: duration,
            })
        })
        .collect()
}

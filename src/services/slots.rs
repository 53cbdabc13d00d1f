//! Bookable slot service

use chrono::{NaiveDate, NaiveDateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilityWindow, BlockedTime},
        booking::Booking,
        calendar::Calendar,
    },
    repository::Repository,
    scheduling::{slots::generate_slots, BookedInterval, DateBlock, Slot, WeeklyWindow},
};

/// Longest range a single slots request may cover
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Clone)]
pub struct SlotsService {
    repository: Repository,
}

impl SlotsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Slots of a calendar in `[from, to]`, evaluated against the current time
    pub async fn list_slots(&self, calendar_id: i32, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Slot>> {
        if to < from {
            return Err(AppError::Validation("'to' must not be before 'from'".to_string()));
        }
        if (to - from).num_days() > MAX_RANGE_DAYS {
            return Err(AppError::Validation(format!(
                "Date range is limited to {} days",
                MAX_RANGE_DAYS
            )));
        }

        let calendar = self.repository.calendars.get_by_id(calendar_id).await?;
        let windows = self.repository.availability.list_windows(calendar_id).await?;
        let blocked = self
            .repository
            .availability
            .list_blocked_between(&calendar.coach_id, from, to)
            .await?;
        let bookings = self
            .repository
            .bookings
            .list_live_between(calendar_id, from, to)
            .await?;

        let slots = slots_for(
            &calendar,
            &windows,
            &blocked,
            &bookings,
            from,
            to,
            calendar.local_now(Utc::now()),
        );
        tracing::debug!(calendar_id, %from, %to, count = slots.len(), "Slots generated");
        Ok(slots)
    }
}

/// Run slot generation over stored rows
pub fn slots_for(
    calendar: &Calendar,
    windows: &[AvailabilityWindow],
    blocked: &[BlockedTime],
    bookings: &[Booking],
    from: NaiveDate,
    to: NaiveDate,
    now: NaiveDateTime,
) -> Vec<Slot> {
    let weekly: Vec<WeeklyWindow> = windows.iter().map(AvailabilityWindow::weekly).collect();
    let blocks: Vec<DateBlock> = blocked.iter().map(BlockedTime::as_block).collect();
    let booked: Vec<BookedInterval> = bookings
        .iter()
        .filter(|b| b.status.occupies_slot())
        .map(Booking::interval)
        .collect();

    generate_slots(&calendar.policy(), &weekly, &blocks, &booked, from, to, now)
}

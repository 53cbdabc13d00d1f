//! Booking ledger service

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingAction, BookingStatus, CreateBooking, NewBooking},
        calendar::Calendar,
        event::DomainEvent,
    },
    repository::Repository,
    scheduling::{
        booking::{find_conflict, transition},
        dates::{parse_date, parse_time},
        BookedInterval, Transition,
    },
};

use super::{events::EventBus, slots::slots_for};

const SLOT_UNAVAILABLE: &str = "This time is no longer available; please pick another time";

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    events: EventBus,
}

impl BookingsService {
    pub fn new(repository: Repository, events: EventBus) -> Self {
        Self { repository, events }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        self.repository.bookings.get_by_id(id).await
    }

    /// Booking together with the calendar it belongs to
    pub async fn get_with_calendar(&self, id: Uuid) -> AppResult<(Booking, Calendar)> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        let calendar = self.repository.calendars.get_by_id(booking.calendar_id).await?;
        Ok((booking, calendar))
    }

    pub async fn list(
        &self,
        calendar_id: i32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        self.repository.calendars.get_by_id(calendar_id).await?;
        self.repository.bookings.list(calendar_id, from, to, status).await
    }

    /// Create a PENDING booking.
    ///
    /// The calendar row stays locked from the slot check to the insert, so
    /// concurrent requests for one calendar are decided one at a time; the
    /// storage exclusion constraint rejects any overlap that slips through.
    pub async fn create_booking(
        &self,
        request: &CreateBooking,
        athlete_id: Option<&str>,
    ) -> AppResult<Booking> {
        request.validate()?;
        let booking = NewBooking {
            calendar_id: request.calendar_id,
            date: parse_date(&request.date, "date")?,
            time: parse_time(&request.time, "time")?,
            duration_minutes: request.duration_minutes,
            booker_name: request.booker_name.trim().to_string(),
            booker_email: request.booker_email.clone(),
            athlete_id: athlete_id.map(str::to_string),
            notes: request.notes.clone(),
        };

        let mut lock = self.repository.bookings.lock_calendar(booking.calendar_id).await?;
        let calendar = lock.calendar.clone();

        if booking.duration_minutes != calendar.slot_duration_minutes {
            return Err(AppError::SlotUnavailable(format!(
                "Slots on this calendar last {} minutes; please pick another time",
                calendar.slot_duration_minutes
            )));
        }

        let windows = lock.windows().await?;
        let blocked = lock.blocked_on(booking.date).await?;
        let existing = lock.live_bookings_on(booking.date).await?;

        let existing_intervals: Vec<BookedInterval> = existing.iter().map(Booking::interval).collect();
        if let Some(conflict) = find_conflict(&booking.interval(), &existing_intervals) {
            tracing::debug!(
                calendar_id = calendar.id,
                date = %booking.date,
                conflict_start = conflict.start_minute,
                "Booking rejected: overlaps an existing booking"
            );
            return Err(AppError::SlotUnavailable(SLOT_UNAVAILABLE.to_string()));
        }

        let slots = slots_for(
            &calendar,
            &windows,
            &blocked,
            &existing,
            booking.date,
            booking.date,
            calendar.local_now(Utc::now()),
        );
        let offered = slots
            .iter()
            .any(|s| s.time == booking.time && s.duration_minutes == booking.duration_minutes);
        if !offered {
            tracing::debug!(
                calendar_id = calendar.id,
                date = %booking.date,
                time = %booking.time,
                "Booking rejected: not an open slot"
            );
            return Err(AppError::SlotUnavailable(SLOT_UNAVAILABLE.to_string()));
        }

        let created = lock.insert(&booking).await?;
        lock.commit().await?;

        tracing::info!(
            booking_id = %created.id,
            calendar_id = calendar.id,
            date = %created.booking_date,
            time = %created.start_time,
            "Booking created"
        );
        self.events.publish(DomainEvent::BookingCreated {
            coach_id: calendar.coach_id,
            booking: created.clone(),
        });
        Ok(created)
    }

    pub async fn confirm_booking(&self, id: Uuid) -> AppResult<Booking> {
        self.apply(id, BookingAction::Confirm, None).await
    }

    /// Cancelling an already cancelled booking returns it unchanged
    pub async fn cancel_booking(&self, id: Uuid, reason: Option<&str>) -> AppResult<Booking> {
        self.apply(id, BookingAction::Cancel, reason).await
    }

    pub async fn complete_booking(&self, id: Uuid) -> AppResult<Booking> {
        self.apply(id, BookingAction::Complete, None).await
    }

    pub async fn apply(
        &self,
        id: Uuid,
        action: BookingAction,
        reason: Option<&str>,
    ) -> AppResult<Booking> {
        let (booking, calendar) = self.get_with_calendar(id).await?;

        let next = match transition(booking.status, action)? {
            Transition::Unchanged => return Ok(booking),
            Transition::Apply(next) => next,
        };
        let reason = if action == BookingAction::Cancel { reason } else { None };

        // Guarded on the status read above: a concurrent transition makes this a no-op
        let updated = self
            .repository
            .bookings
            .update_status(id, booking.status, next, reason)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState(format!(
                    "Booking {} was modified by another request; refresh and retry",
                    id
                ))
            })?;

        tracing::info!(
            booking_id = %id,
            from = %booking.status,
            to = %updated.status,
            "Booking status changed"
        );

        let coach_id = calendar.coach_id;
        let event = match next {
            BookingStatus::Confirmed => DomainEvent::BookingConfirmed { coach_id, booking: updated.clone() },
            BookingStatus::Cancelled => DomainEvent::BookingCancelled { coach_id, booking: updated.clone() },
            BookingStatus::Completed => DomainEvent::BookingCompleted { coach_id, booking: updated.clone() },
            BookingStatus::Pending => return Ok(updated),
        };
        self.events.publish(event);
        Ok(updated)
    }
}

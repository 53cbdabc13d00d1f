//! Bookings repository for database operations
//!
//! Booking creation goes through [`CalendarLock`]: the calendar row is locked
//! with `SELECT ... FOR UPDATE` so concurrent creations on one calendar run one
//! after the other, and the overlap check and insert share a transaction.

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilityWindow, BlockedTime},
        booking::{Booking, BookingStatus, NewBooking},
        calendar::Calendar,
    },
};

const EXCLUSION_VIOLATION: &str = "23P01";
const SERIALIZATION_FAILURE: &str = "40001";

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Non-cancelled bookings of a calendar within an inclusive date range
    pub async fn list_live_between(
        &self,
        calendar_id: i32,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE calendar_id = $1
              AND booking_date BETWEEN $2 AND $3
              AND status <> 'cancelled'
            ORDER BY booking_date, start_time
            "#,
        )
        .bind(calendar_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// List bookings of a calendar with optional filters
    pub async fn list(
        &self,
        calendar_id: i32,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let mut conditions = vec!["calendar_id = $1".to_string()];
        let mut idx = 2;

        if from.is_some() {
            conditions.push(format!("booking_date >= ${}", idx));
            idx += 1;
        }
        if to.is_some() {
            conditions.push(format!("booking_date <= ${}", idx));
            idx += 1;
        }
        if status.is_some() {
            conditions.push(format!("status = ${}", idx));
        }

        let query = format!(
            "SELECT * FROM bookings WHERE {} ORDER BY booking_date, start_time",
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, Booking>(&query).bind(calendar_id);
        if let Some(d) = from { builder = builder.bind(d); }
        if let Some(d) = to { builder = builder.bind(d); }
        if let Some(s) = status { builder = builder.bind(s); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Start a booking transaction holding the calendar's row lock
    pub async fn lock_calendar(&self, calendar_id: i32) -> AppResult<CalendarLock> {
        let mut tx = self.pool.begin().await?;
        let calendar = sqlx::query_as::<_, Calendar>(
            "SELECT * FROM calendars WHERE id = $1 FOR UPDATE",
        )
        .bind(calendar_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Calendar {} not found", calendar_id)))?;
        Ok(CalendarLock { tx, calendar })
    }

    /// Compare-and-set a booking's status; `None` if it was no longer `expected`
    pub async fn update_status(
        &self,
        id: Uuid,
        expected: BookingStatus,
        status: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $3,
                cancellation_reason = COALESCE($4, cancellation_reason),
                modif_date = $5
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(status)
        .bind(cancellation_reason)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Open transaction with the calendar row locked
pub struct CalendarLock {
    tx: Transaction<'static, Postgres>,
    pub calendar: Calendar,
}

impl CalendarLock {
    pub async fn windows(&mut self) -> AppResult<Vec<AvailabilityWindow>> {
        let rows = sqlx::query_as::<_, AvailabilityWindow>(
            "SELECT * FROM availability_windows WHERE calendar_id = $1",
        )
        .bind(self.calendar.id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    /// The owning coach's blocked times on `date`
    pub async fn blocked_on(&mut self, date: NaiveDate) -> AppResult<Vec<BlockedTime>> {
        let rows = sqlx::query_as::<_, BlockedTime>(
            "SELECT * FROM blocked_times WHERE coach_id = $1 AND blocked_date = $2",
        )
        .bind(&self.calendar.coach_id)
        .bind(date)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    /// Non-cancelled bookings of the calendar on `date`
    pub async fn live_bookings_on(&mut self, date: NaiveDate) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE calendar_id = $1 AND booking_date = $2 AND status <> 'cancelled'
            "#,
        )
        .bind(self.calendar.id)
        .bind(date)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    /// Insert a PENDING booking; storage-level overlaps surface as `SlotUnavailable`
    pub async fn insert(&mut self, booking: &NewBooking) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, calendar_id, booking_date, start_time, duration_minutes,
                booker_name, booker_email, athlete_id, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking.calendar_id)
        .bind(booking.date)
        .bind(booking.time)
        .bind(booking.duration_minutes)
        .bind(&booking.booker_name)
        .bind(&booking.booker_email)
        .bind(&booking.athlete_id)
        .bind(BookingStatus::Pending)
        .bind(&booking.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(slot_taken)
    }

    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await.map_err(slot_taken)
    }
}

fn slot_taken(e: sqlx::Error) -> AppError {
    let err = AppError::from(e);
    match err.sql_state().as_deref() {
        Some(EXCLUSION_VIOLATION) | Some(SERIALIZATION_FAILURE) => {
            AppError::SlotUnavailable("This time was just booked; please pick another time".to_string())
        }
        _ => err,
    }
}

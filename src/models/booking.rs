//! Booking model and status lifecycle types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::scheduling::{dates::minutes_of_day, BookedInterval};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Every status except CANCELLED keeps its slot taken
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        };
        write!(f, "{}", label)
    }
}

/// Coach-side actions on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Confirm,
    Cancel,
    Complete,
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Cancel => "cancel",
            BookingAction::Complete => "complete",
        };
        write!(f, "{}", label)
    }
}

/// Booking record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub calendar_id: i32,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub booker_name: String,
    pub booker_email: Option<String>,
    /// Set when the booker is an authenticated athlete
    pub athlete_id: Option<String>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub crea_date: DateTime<Utc>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn interval(&self) -> BookedInterval {
        BookedInterval {
            date: self.booking_date,
            start_minute: minutes_of_day(self.start_time),
            duration_minutes: self.duration_minutes,
        }
    }
}

/// Create booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBooking {
    pub calendar_id: i32,
    /// Date (YYYY-MM-DD)
    pub date: String,
    /// Start time (HH:MM)
    pub time: String,
    #[validate(range(min = 1, max = 1440, message = "Duration must be 1-1440 minutes"))]
    pub duration_minutes: i32,
    #[validate(length(min = 1, max = 120, message = "Booker name must be 1-120 characters"))]
    pub booker_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub booker_email: Option<String>,
    #[validate(length(max = 2000, message = "Notes are limited to 2000 characters"))]
    pub notes: Option<String>,
}

/// Validated booking ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub calendar_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub booker_name: String,
    pub booker_email: Option<String>,
    pub athlete_id: Option<String>,
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn interval(&self) -> BookedInterval {
        BookedInterval {
            date: self.date,
            start_minute: minutes_of_day(self.time),
            duration_minutes: self.duration_minutes,
        }
    }
}

/// Status change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingStatus {
    pub action: BookingAction,
    /// Cancellation reason (cancel only)
    #[validate(length(max = 500, message = "Reason is limited to 500 characters"))]
    pub reason: Option<String>,
}

/// Query parameters for listing a calendar's bookings
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookingQuery {
    /// From date (YYYY-MM-DD)
    pub from: Option<String>,
    /// To date (YYYY-MM-DD)
    pub to: Option<String>,
    pub status: Option<BookingStatus>,
}

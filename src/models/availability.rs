//! Availability models: weekly windows and blocked time

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::scheduling::{dates::minutes_of_day, DateBlock, WeeklyWindow};

// ---------------------------------------------------------------------------
// AvailabilityWindow
// ---------------------------------------------------------------------------

/// A recurring weekly availability window of a calendar
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AvailabilityWindow {
    pub id: i32,
    /// Parent calendar ID
    pub calendar_id: i32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub crea_date: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    pub fn weekly(&self) -> WeeklyWindow {
        WeeklyWindow {
            day_of_week: self.day_of_week as u8,
            start_minute: minutes_of_day(self.start_time),
            end_minute: minutes_of_day(self.end_time),
        }
    }
}

/// One window in a set-availability request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AvailabilityWindowInput {
    /// Day of week (0=Monday, 6=Sunday)
    #[validate(range(min = 0, max = 6, message = "day_of_week must be 0-6"))]
    pub day_of_week: i16,
    /// Start time (HH:MM)
    pub start_time: String,
    /// End time (HH:MM)
    pub end_time: String,
}

/// Replace the full weekly availability of a calendar
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetAvailability {
    pub windows: Vec<AvailabilityWindowInput>,
}

/// Validated window ready to be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAvailabilityWindow {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ---------------------------------------------------------------------------
// BlockedTime
// ---------------------------------------------------------------------------

/// Date-specific unavailability of a coach, across all of their calendars
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BlockedTime {
    pub id: i32,
    pub coach_id: String,
    pub blocked_date: NaiveDate,
    pub all_day: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub crea_date: Option<DateTime<Utc>>,
}

impl BlockedTime {
    /// Partial blocks missing a bound are treated as blocking the whole day
    pub fn as_block(&self) -> DateBlock {
        let span = match (self.all_day, self.start_time, self.end_time) {
            (false, Some(start), Some(end)) => Some((minutes_of_day(start), minutes_of_day(end))),
            _ => None,
        };
        DateBlock {
            date: self.blocked_date,
            span,
        }
    }
}

/// Create blocked time request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlockedTime {
    /// Coach the block applies to; defaults to the caller
    pub coach_id: Option<String>,
    /// Date (YYYY-MM-DD)
    pub date: String,
    pub all_day: bool,
    /// Start time (HH:MM), required unless all_day
    pub start_time: Option<String>,
    /// End time (HH:MM), required unless all_day
    pub end_time: Option<String>,
    #[validate(length(max = 500, message = "Reason is limited to 500 characters"))]
    pub reason: Option<String>,
}

/// Validated blocked time ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBlockedTime {
    pub coach_id: String,
    pub date: NaiveDate,
    pub all_day: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
}

/// Query parameters for blocked times
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BlockedTimeQuery {
    /// Coach ID; defaults to the caller
    pub coach_id: Option<String>,
    /// Only entries on or after this date (YYYY-MM-DD)
    pub from: Option<String>,
}

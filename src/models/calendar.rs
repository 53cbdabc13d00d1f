//! Calendar model: a coach's bookable schedule configuration

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    scheduling::SlotPolicy,
};

/// Public booking slugs: lowercase letters, digits and dashes
pub static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{2,63}$").expect("valid slug regex"));

pub const DEFAULT_SLOT_DURATION_MINUTES: i32 = 30;
pub const DEFAULT_BUFFER_MINUTES: i32 = 0;
pub const DEFAULT_MAX_ADVANCE_DAYS: i32 = 30;
pub const DEFAULT_MIN_NOTICE_HOURS: i32 = 24;
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Resolve an IANA zone name such as `Europe/Paris`
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown time zone '{}'", name)))
}

/// Calendar record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Calendar {
    pub id: i32,
    /// Owning coach (opaque identity id)
    pub coach_id: String,
    pub name: String,
    /// Length of every slot in minutes
    pub slot_duration_minutes: i32,
    /// Gap left between consecutive slots in minutes
    pub buffer_minutes: i32,
    /// How many days ahead a slot may be booked
    pub max_advance_days: i32,
    /// How many hours before its start a slot stops being bookable
    pub min_notice_hours: i32,
    pub is_public: bool,
    /// Unique slug for the public booking page
    pub public_slug: Option<String>,
    /// IANA zone the availability windows and booking times are written in
    pub timezone: String,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl Calendar {
    pub fn policy(&self) -> SlotPolicy {
        SlotPolicy {
            slot_duration_minutes: self.slot_duration_minutes,
            buffer_minutes: self.buffer_minutes,
            max_advance_days: self.max_advance_days,
            min_notice_hours: self.min_notice_hours,
        }
    }

    /// Wall-clock time of the calendar at the instant `now`
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match parse_timezone(&self.timezone) {
            Ok(tz) => now.with_timezone(&tz).naive_local(),
            Err(_) => {
                tracing::warn!(calendar_id = self.id, timezone = %self.timezone, "Unknown calendar time zone, using UTC");
                now.naive_utc()
            }
        }
    }
}

/// Create calendar request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCalendar {
    /// Owning coach; defaults to the caller (admins may set it)
    pub coach_id: Option<String>,
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,
    #[validate(range(min = 1, max = 1440, message = "Slot duration must be 1-1440 minutes"))]
    pub slot_duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 1440, message = "Buffer must be 0-1440 minutes"))]
    pub buffer_minutes: Option<i32>,
    #[validate(range(min = 0, max = 365, message = "Advance window must be 0-365 days"))]
    pub max_advance_days: Option<i32>,
    #[validate(range(min = 0, max = 8760, message = "Notice must be 0-8760 hours"))]
    pub min_notice_hours: Option<i32>,
    pub is_public: Option<bool>,
    #[validate(regex(path = *SLUG_REGEX, message = "Slug must be 3-64 lowercase letters, digits or dashes"))]
    pub public_slug: Option<String>,
    /// IANA time zone name, `UTC` when omitted
    #[validate(length(min = 1, max = 64, message = "Time zone must be 1-64 characters"))]
    pub timezone: Option<String>,
}

/// Update calendar request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCalendar {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 1440, message = "Slot duration must be 1-1440 minutes"))]
    pub slot_duration_minutes: Option<i32>,
    #[validate(range(min = 0, max = 1440, message = "Buffer must be 0-1440 minutes"))]
    pub buffer_minutes: Option<i32>,
    #[validate(range(min = 0, max = 365, message = "Advance window must be 0-365 days"))]
    pub max_advance_days: Option<i32>,
    #[validate(range(min = 0, max = 8760, message = "Notice must be 0-8760 hours"))]
    pub min_notice_hours: Option<i32>,
    pub is_public: Option<bool>,
    #[validate(regex(path = *SLUG_REGEX, message = "Slug must be 3-64 lowercase letters, digits or dashes"))]
    pub public_slug: Option<String>,
    /// IANA time zone name, `UTC` when omitted
    #[validate(length(min = 1, max = 64, message = "Time zone must be 1-64 characters"))]
    pub timezone: Option<String>,
}

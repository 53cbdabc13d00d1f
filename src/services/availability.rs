//! Weekly availability and blocked time service

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::availability::{
        AvailabilityWindow, AvailabilityWindowInput, BlockedTime, CreateBlockedTime,
        NewAvailabilityWindow, NewBlockedTime,
    },
    repository::Repository,
    scheduling::dates::{parse_date, parse_time},
};

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
}

impl AvailabilityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_availability(&self, calendar_id: i32) -> AppResult<Vec<AvailabilityWindow>> {
        self.repository.calendars.get_by_id(calendar_id).await?;
        self.repository.availability.list_windows(calendar_id).await
    }

    /// Replace the weekly windows of a calendar. Nothing is written if any
    /// window is invalid.
    pub async fn set_availability(
        &self,
        calendar_id: i32,
        windows: &[AvailabilityWindowInput],
    ) -> AppResult<Vec<AvailabilityWindow>> {
        let windows = validate_windows(windows)?;
        self.repository.calendars.get_by_id(calendar_id).await?;

        let stored = self
            .repository
            .availability
            .replace_windows(calendar_id, &windows)
            .await?;
        tracing::info!(calendar_id, windows = stored.len(), "Availability replaced");
        Ok(stored)
    }

    pub async fn add_blocked_time(
        &self,
        coach_id: &str,
        data: &CreateBlockedTime,
    ) -> AppResult<BlockedTime> {
        let blocked = validate_blocked_time(coach_id, data)?;
        let created = self.repository.availability.create_blocked(&blocked).await?;
        tracing::info!(
            blocked_time_id = created.id,
            coach_id,
            date = %created.blocked_date,
            all_day = created.all_day,
            "Blocked time added"
        );
        Ok(created)
    }

    pub async fn get_blocked_time(&self, id: i32) -> AppResult<BlockedTime> {
        self.repository.availability.get_blocked(id).await
    }

    pub async fn remove_blocked_time(&self, id: i32) -> AppResult<()> {
        self.repository.availability.delete_blocked(id).await
    }

    pub async fn get_blocked_times(
        &self,
        coach_id: &str,
        from: Option<NaiveDate>,
    ) -> AppResult<Vec<BlockedTime>> {
        self.repository.availability.list_blocked(coach_id, from).await
    }
}

fn validate_windows(windows: &[AvailabilityWindowInput]) -> AppResult<Vec<NewAvailabilityWindow>> {
    windows
        .iter()
        .enumerate()
        .map(|(i, w)| {
            w.validate()?;
            let start_time = parse_time(&w.start_time, "start_time")?;
            let end_time = parse_time(&w.end_time, "end_time")?;
            if start_time >= end_time {
                return Err(AppError::Validation(format!(
                    "Window {}: start_time must be before end_time",
                    i + 1
                )));
            }
            Ok(NewAvailabilityWindow {
                day_of_week: w.day_of_week,
                start_time,
                end_time,
            })
        })
        .collect()
}

fn validate_blocked_time(coach_id: &str, data: &CreateBlockedTime) -> AppResult<NewBlockedTime> {
    data.validate()?;
    let date = parse_date(&data.date, "date")?;

    let (start_time, end_time) = if data.all_day {
        (None, None)
    } else {
        let (Some(start), Some(end)) = (data.start_time.as_deref(), data.end_time.as_deref()) else {
            return Err(AppError::Validation(
                "start_time and end_time are required unless all_day is set".to_string(),
            ));
        };
        let start = parse_time(start, "start_time")?;
        let end = parse_time(end, "end_time")?;
        if start >= end {
            return Err(AppError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }
        (Some(start), Some(end))
    };

    Ok(NewBlockedTime {
        coach_id: coach_id.to_string(),
        date,
        all_day: data.all_day,
        start_time,
        end_time,
        reason: data.reason.clone(),
    })
}

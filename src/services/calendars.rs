//! Calendar management service

use validator::Validate;

use crate::{
    error::AppResult,
    models::calendar::{parse_timezone, Calendar, CreateCalendar, UpdateCalendar},
    repository::Repository,
};

#[derive(Clone)]
pub struct CalendarsService {
    repository: Repository,
}

impl CalendarsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Calendar> {
        self.repository.calendars.get_by_id(id).await
    }

    /// Public lookup; private calendars are reported as not found
    pub async fn get_public_by_slug(&self, slug: &str) -> AppResult<Calendar> {
        let calendar = self.repository.calendars.get_by_slug(slug).await?;
        if !calendar.is_public {
            return Err(crate::error::AppError::NotFound(format!(
                "Calendar '{}' not found",
                slug
            )));
        }
        Ok(calendar)
    }

    pub async fn list_by_coach(&self, coach_id: &str) -> AppResult<Vec<Calendar>> {
        self.repository.calendars.list_by_coach(coach_id).await
    }

    pub async fn create(&self, coach_id: &str, data: &CreateCalendar) -> AppResult<Calendar> {
        data.validate()?;
        if let Some(tz) = &data.timezone {
            parse_timezone(tz)?;
        }
        let calendar = self.repository.calendars.create(coach_id, data).await?;
        tracing::info!(calendar_id = calendar.id, coach_id, "Calendar created");
        Ok(calendar)
    }

    pub async fn update(&self, id: i32, data: &UpdateCalendar) -> AppResult<Calendar> {
        data.validate()?;
        if let Some(tz) = &data.timezone {
            parse_timezone(tz)?;
        }
        self.repository.calendars.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.calendars.delete(id).await?;
        tracing::info!(calendar_id = id, "Calendar deleted");
        Ok(())
    }
}

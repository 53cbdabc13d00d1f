//! Calendars repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::calendar::{
        Calendar, CreateCalendar, UpdateCalendar, DEFAULT_BUFFER_MINUTES,
        DEFAULT_MAX_ADVANCE_DAYS, DEFAULT_MIN_NOTICE_HOURS, DEFAULT_SLOT_DURATION_MINUTES,
        DEFAULT_TIMEZONE,
    },
};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct CalendarsRepository {
    pool: Pool<Postgres>,
}

impl CalendarsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get calendar by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Calendar> {
        sqlx::query_as::<_, Calendar>("SELECT * FROM calendars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Calendar {} not found", id)))
    }

    /// Get a calendar by its public booking slug
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Calendar> {
        sqlx::query_as::<_, Calendar>("SELECT * FROM calendars WHERE public_slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No calendar with slug '{}'", slug)))
    }

    /// List a coach's calendars
    pub async fn list_by_coach(&self, coach_id: &str) -> AppResult<Vec<Calendar>> {
        let rows = sqlx::query_as::<_, Calendar>(
            "SELECT * FROM calendars WHERE coach_id = $1 ORDER BY name, id",
        )
        .bind(coach_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a calendar
    pub async fn create(&self, coach_id: &str, data: &CreateCalendar) -> AppResult<Calendar> {
        sqlx::query_as::<_, Calendar>(
            r#"
            INSERT INTO calendars (
                coach_id, name, slot_duration_minutes, buffer_minutes,
                max_advance_days, min_notice_hours, is_public, public_slug, timezone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(coach_id)
        .bind(&data.name)
        .bind(data.slot_duration_minutes.unwrap_or(DEFAULT_SLOT_DURATION_MINUTES))
        .bind(data.buffer_minutes.unwrap_or(DEFAULT_BUFFER_MINUTES))
        .bind(data.max_advance_days.unwrap_or(DEFAULT_MAX_ADVANCE_DAYS))
        .bind(data.min_notice_hours.unwrap_or(DEFAULT_MIN_NOTICE_HOURS))
        .bind(data.is_public.unwrap_or(false))
        .bind(&data.public_slug)
        .bind(data.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))
        .fetch_one(&self.pool)
        .await
        .map_err(slug_conflict)
    }

    /// Update a calendar
    pub async fn update(&self, id: i32, data: &UpdateCalendar) -> AppResult<Calendar> {
        let now = Utc::now();
        let mut sets = vec!["modif_date = $1".to_string()];
        let mut idx = 2;

        if data.name.is_some() { sets.push(format!("name = ${}", idx)); idx += 1; }
        if data.slot_duration_minutes.is_some() { sets.push(format!("slot_duration_minutes = ${}", idx)); idx += 1; }
        if data.buffer_minutes.is_some() { sets.push(format!("buffer_minutes = ${}", idx)); idx += 1; }
        if data.max_advance_days.is_some() { sets.push(format!("max_advance_days = ${}", idx)); idx += 1; }
        if data.min_notice_hours.is_some() { sets.push(format!("min_notice_hours = ${}", idx)); idx += 1; }
        if data.is_public.is_some() { sets.push(format!("is_public = ${}", idx)); idx += 1; }
        if data.public_slug.is_some() { sets.push(format!("public_slug = ${}", idx)); idx += 1; }
        if data.timezone.is_some() { sets.push(format!("timezone = ${}", idx)); idx += 1; }

        let query = format!(
            "UPDATE calendars SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Calendar>(&query).bind(now);
        if let Some(ref name) = data.name { builder = builder.bind(name); }
        if let Some(v) = data.slot_duration_minutes { builder = builder.bind(v); }
        if let Some(v) = data.buffer_minutes { builder = builder.bind(v); }
        if let Some(v) = data.max_advance_days { builder = builder.bind(v); }
        if let Some(v) = data.min_notice_hours { builder = builder.bind(v); }
        if let Some(v) = data.is_public { builder = builder.bind(v); }
        if let Some(ref slug) = data.public_slug { builder = builder.bind(slug); }
        if let Some(ref tz) = data.timezone { builder = builder.bind(tz); }

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(slug_conflict)?
            .ok_or_else(|| AppError::NotFound(format!("Calendar {} not found", id)))
    }

    /// Delete a calendar (cascade deletes windows and bookings)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM calendars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Calendar {} not found", id)));
        }
        Ok(())
    }
}

fn slug_conflict(e: sqlx::Error) -> AppError {
    let err = AppError::from(e);
    if err.sql_state().as_deref() == Some(UNIQUE_VIOLATION) {
        AppError::Conflict("Public slug is already taken".to_string())
    } else {
        err
    }
}

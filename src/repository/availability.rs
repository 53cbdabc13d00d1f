//! Availability repository (weekly windows, blocked times)

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::availability::{
        AvailabilityWindow, BlockedTime, NewAvailabilityWindow, NewBlockedTime,
    },
};

#[derive(Clone)]
pub struct AvailabilityRepository {
    pool: Pool<Postgres>,
}

impl AvailabilityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // ---- Weekly windows ----

    /// List windows of a calendar, ordered by day then start
    pub async fn list_windows(&self, calendar_id: i32) -> AppResult<Vec<AvailabilityWindow>> {
        let rows = sqlx::query_as::<_, AvailabilityWindow>(
            "SELECT * FROM availability_windows WHERE calendar_id = $1 ORDER BY day_of_week, start_time",
        )
        .bind(calendar_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace all windows of a calendar in one transaction
    pub async fn replace_windows(
        &self,
        calendar_id: i32,
        windows: &[NewAvailabilityWindow],
    ) -> AppResult<Vec<AvailabilityWindow>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM availability_windows WHERE calendar_id = $1")
            .bind(calendar_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(windows.len());
        for window in windows {
            let row = sqlx::query_as::<_, AvailabilityWindow>(
                r#"
                INSERT INTO availability_windows (calendar_id, day_of_week, start_time, end_time)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(calendar_id)
            .bind(window.day_of_week)
            .bind(window.start_time)
            .bind(window.end_time)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;
        stored.sort_by_key(|w| (w.day_of_week, w.start_time));
        Ok(stored)
    }

    // ---- Blocked times ----

    /// Get a blocked time by ID
    pub async fn get_blocked(&self, id: i32) -> AppResult<BlockedTime> {
        sqlx::query_as::<_, BlockedTime>("SELECT * FROM blocked_times WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Blocked time {} not found", id)))
    }

    /// List a coach's blocked times, optionally from a date onward
    pub async fn list_blocked(
        &self,
        coach_id: &str,
        from: Option<NaiveDate>,
    ) -> AppResult<Vec<BlockedTime>> {
        let rows = sqlx::query_as::<_, BlockedTime>(
            r#"
            SELECT * FROM blocked_times
            WHERE coach_id = $1 AND ($2::date IS NULL OR blocked_date >= $2)
            ORDER BY blocked_date, start_time NULLS FIRST
            "#,
        )
        .bind(coach_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Blocked times of a coach within an inclusive date range
    pub async fn list_blocked_between(
        &self,
        coach_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<BlockedTime>> {
        let rows = sqlx::query_as::<_, BlockedTime>(
            r#"
            SELECT * FROM blocked_times
            WHERE coach_id = $1 AND blocked_date BETWEEN $2 AND $3
            ORDER BY blocked_date
            "#,
        )
        .bind(coach_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a blocked time
    pub async fn create_blocked(&self, data: &NewBlockedTime) -> AppResult<BlockedTime> {
        let row = sqlx::query_as::<_, BlockedTime>(
            r#"
            INSERT INTO blocked_times (coach_id, blocked_date, all_day, start_time, end_time, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.coach_id)
        .bind(data.date)
        .bind(data.all_day)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(&data.reason)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a blocked time
    pub async fn delete_blocked(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM blocked_times WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Blocked time {} not found", id)));
        }
        Ok(())
    }
}

//! Assigned plans repository for database operations

use chrono::{NaiveDate, Utc};
use sqlx::{types::Json, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::plan::{AssignedPlan, AssignedPlanRow, PlanWeek, ScheduleStatus},
    scheduling::{PauseState, Schedule},
};

#[derive(Clone)]
pub struct PlansRepository {
    pool: Pool<Postgres>,
}

impl PlansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get plan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<AssignedPlan> {
        let row = sqlx::query_as::<_, AssignedPlanRow>("SELECT * FROM assigned_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", id)))?;
        Ok(row.into())
    }

    /// Plans of an athlete, most recent first
    pub async fn list_by_athlete(&self, athlete_id: &str) -> AppResult<Vec<AssignedPlan>> {
        let rows = sqlx::query_as::<_, AssignedPlanRow>(
            "SELECT * FROM assigned_plans WHERE athlete_id = $1 ORDER BY start_date DESC, id DESC",
        )
        .bind(athlete_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Register a plan; it starts PENDING with an empty schedule
    pub async fn create(
        &self,
        athlete_id: &str,
        coach_id: Option<&str>,
        name: &str,
        start_date: NaiveDate,
        weeks: &[PlanWeek],
    ) -> AppResult<AssignedPlan> {
        let row = sqlx::query_as::<_, AssignedPlanRow>(
            r#"
            INSERT INTO assigned_plans (athlete_id, coach_id, name, start_date, weeks, crea_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(athlete_id)
        .bind(coach_id)
        .bind(name)
        .bind(start_date)
        .bind(Json(weeks))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Store a (re)generated schedule with its weekdays and status. The write
    /// only lands while the row still carries the pause state the caller read.
    pub async fn save_schedule(
        &self,
        id: i32,
        expected: &PauseState,
        schedule: &Schedule,
        weekdays: &[i16],
        status: ScheduleStatus,
    ) -> AppResult<AssignedPlan> {
        let row = sqlx::query_as::<_, AssignedPlanRow>(
            r#"
            UPDATE assigned_plans
            SET schedule = $4, selected_weekdays = $5, schedule_status = $6, modif_date = $7
            WHERE id = $1 AND schedule_status = $2
              AND last_pause_date IS NOT DISTINCT FROM $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.status)
        .bind(expected.last_pause_date)
        .bind(Json(schedule))
        .bind(weekdays)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;
        Ok(row.into())
    }

    /// Store pause fields, guarded on the status and last pause the caller read
    pub async fn save_pause_state(
        &self,
        id: i32,
        expected: &PauseState,
        state: &PauseState,
    ) -> AppResult<AssignedPlan> {
        let row = sqlx::query_as::<_, AssignedPlanRow>(
            r#"
            UPDATE assigned_plans
            SET schedule_status = $4, paused_at = $5, pause_until = $6,
                last_pause_date = $7, modif_date = $8
            WHERE id = $1 AND schedule_status = $2
              AND last_pause_date IS NOT DISTINCT FROM $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.status)
        .bind(expected.last_pause_date)
        .bind(state.status)
        .bind(state.paused_at)
        .bind(state.pause_until)
        .bind(state.last_pause_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;
        Ok(row.into())
    }
}

fn changed_concurrently(id: i32) -> AppError {
    AppError::InvalidState(format!("Plan {} changed concurrently, reload and retry", id))
}

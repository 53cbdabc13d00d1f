//! Assigned training plan model and its schedule fields

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use validator::Validate;

use crate::scheduling::{PauseState, Schedule};

/// Scheduling status of an assigned plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "schedule_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Active,
    Paused,
}

/// A training session inside a plan week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanSession {
    /// Stable session id from the plan catalog
    pub id: String,
    /// Position within the week; decides which chosen weekday it gets
    pub order: i32,
    #[serde(default)]
    pub name: Option<String>,
}

/// An ordered list of sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlanWeek {
    #[serde(default)]
    pub name: Option<String>,
    pub sessions: Vec<PlanSession>,
}

/// Internal row structure for database queries (JSONB columns)
#[derive(Debug, Clone, FromRow)]
pub struct AssignedPlanRow {
    pub id: i32,
    pub athlete_id: String,
    pub coach_id: Option<String>,
    pub name: String,
    pub start_date: NaiveDate,
    pub weeks: Json<Vec<PlanWeek>>,
    pub schedule: Json<Schedule>,
    pub selected_weekdays: Option<Vec<i16>>,
    pub schedule_status: ScheduleStatus,
    pub paused_at: Option<DateTime<Utc>>,
    pub pause_until: Option<DateTime<Utc>>,
    pub last_pause_date: Option<DateTime<Utc>>,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// An athlete's instance of a training plan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignedPlan {
    pub id: i32,
    pub athlete_id: String,
    pub coach_id: Option<String>,
    pub name: String,
    pub start_date: NaiveDate,
    pub weeks: Vec<PlanWeek>,
    /// Date (YYYY-MM-DD) to session id
    #[schema(value_type = Object)]
    pub schedule: Schedule,
    /// Weekdays (0=Monday) chosen at the last (re)scheduling
    pub selected_weekdays: Vec<i16>,
    pub schedule_status: ScheduleStatus,
    pub paused_at: Option<DateTime<Utc>>,
    pub pause_until: Option<DateTime<Utc>>,
    pub last_pause_date: Option<DateTime<Utc>>,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

impl From<AssignedPlanRow> for AssignedPlan {
    fn from(row: AssignedPlanRow) -> Self {
        Self {
            id: row.id,
            athlete_id: row.athlete_id,
            coach_id: row.coach_id,
            name: row.name,
            start_date: row.start_date,
            weeks: row.weeks.0,
            schedule: row.schedule.0,
            selected_weekdays: row.selected_weekdays.unwrap_or_default(),
            schedule_status: row.schedule_status,
            paused_at: row.paused_at,
            pause_until: row.pause_until,
            last_pause_date: row.last_pause_date,
            crea_date: row.crea_date,
            modif_date: row.modif_date,
        }
    }
}

impl AssignedPlan {
    pub fn pause_state(&self) -> PauseState {
        PauseState {
            status: self.schedule_status,
            paused_at: self.paused_at,
            pause_until: self.pause_until,
            last_pause_date: self.last_pause_date,
        }
    }

    /// Whether a user may read or reschedule this plan
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.athlete_id == user_id || self.coach_id.as_deref() == Some(user_id)
    }
}

/// Register a plan delivered by the plan catalog
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlan {
    #[validate(length(min = 1, message = "athlete_id is required"))]
    pub athlete_id: String,
    pub coach_id: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    /// Start date (YYYY-MM-DD)
    pub start_date: String,
    #[validate(length(min = 1, message = "A plan needs at least one week"))]
    pub weeks: Vec<PlanWeek>,
}

/// Initial scheduling request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleRequest {
    /// Chosen weekdays (0=Monday), one per weekly session
    pub weekdays: Vec<i16>,
    /// Start date (YYYY-MM-DD); defaults to the plan start date
    pub start_date: Option<String>,
}

/// Replan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplanRequest {
    /// New weekdays (0=Monday), one per weekly session
    pub weekdays: Vec<i16>,
    /// First date that may change (YYYY-MM-DD); defaults to today
    pub from_date: Option<String>,
}

/// Pause request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PauseRequest {
    /// Pause length in weeks
    pub weeks: i32,
}

/// Schedule returned by scheduling operations
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub plan_id: i32,
    pub schedule_status: ScheduleStatus,
    pub selected_weekdays: Vec<i16>,
    #[schema(value_type = Object)]
    pub schedule: Schedule,
}

impl From<&AssignedPlan> for ScheduleResponse {
    fn from(plan: &AssignedPlan) -> Self {
        Self {
            plan_id: plan.id,
            schedule_status: plan.schedule_status,
            selected_weekdays: plan.selected_weekdays.clone(),
            schedule: plan.schedule.clone(),
        }
    }
}

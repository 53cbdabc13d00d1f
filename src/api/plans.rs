//! Training plan scheduling endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::{
        plan::{AssignedPlan, CreatePlan, PauseRequest, ReplanRequest, ScheduleRequest, ScheduleResponse},
        user::UserClaims,
    },
    AppState,
};

use super::AuthenticatedUser;

fn require_participant(claims: &UserClaims, plan: &AssignedPlan) -> AppResult<()> {
    if claims.is_admin() || plan.is_participant(&claims.sub) {
        Ok(())
    } else {
        Err(AppError::Authorization("Not allowed to access this plan".to_string()))
    }
}

/// Query parameters for listing plans
#[derive(Debug, Deserialize, IntoParams)]
pub struct PlanQuery {
    /// Athlete ID; defaults to the caller
    pub athlete_id: Option<String>,
}

/// Register a plan assigned to an athlete
#[utoipa::path(
    post,
    path = "/plans",
    tag = "plans",
    security(("bearer_auth" = [])),
    request_body = CreatePlan,
    responses(
        (status = 201, description = "Plan registered, not yet scheduled", body = AssignedPlan),
        (status = 400, description = "Invalid plan structure"),
        (status = 403, description = "Coach account required")
    )
)]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(mut data): Json<CreatePlan>,
) -> AppResult<(StatusCode, Json<AssignedPlan>)> {
    if !claims.is_admin() {
        data.coach_id = Some(claims.resolve_coach_id(data.coach_id.as_deref())?);
    }

    let plan = state.services.plans.create(&data).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// List an athlete's plans
#[utoipa::path(
    get,
    path = "/plans",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(PlanQuery),
    responses(
        (status = 200, description = "Plans, most recent first", body = Vec<AssignedPlan>)
    )
)]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PlanQuery>,
) -> AppResult<Json<Vec<AssignedPlan>>> {
    let athlete_id = query.athlete_id.unwrap_or_else(|| claims.sub.clone());
    let plans = state.services.plans.list_by_athlete(&athlete_id).await?;
    Ok(Json(
        plans
            .into_iter()
            .filter(|p| require_participant(&claims, p).is_ok())
            .collect(),
    ))
}

/// Get plan by ID
#[utoipa::path(
    get,
    path = "/plans/{id}",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan with its schedule", body = AssignedPlan),
        (status = 403, description = "Not the athlete or coach of the plan"),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AssignedPlan>> {
    let plan = state.services.plans.get(id).await?;
    require_participant(&claims, &plan)?;
    Ok(Json(plan))
}

/// Generate the initial schedule from chosen weekdays
#[utoipa::path(
    post,
    path = "/plans/{id}/schedule",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Generated schedule", body = ScheduleResponse),
        (status = 400, description = "Weekdays do not match sessions per week"),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Plan already scheduled, use replan", body = crate::error::ErrorResponse)
    )
)]
pub async fn schedule_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ScheduleRequest>,
) -> AppResult<Json<ScheduleResponse>> {
    let plan = state.services.plans.get(id).await?;
    require_participant(&claims, &plan)?;

    let plan = state.services.plans.schedule(id, &request).await?;
    Ok(Json(ScheduleResponse::from(&plan)))
}

/// Move remaining sessions onto new weekdays, keeping past entries
#[utoipa::path(
    post,
    path = "/plans/{id}/replan",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    request_body = ReplanRequest,
    responses(
        (status = 200, description = "Updated schedule", body = ScheduleResponse),
        (status = 400, description = "Weekdays do not match sessions per week"),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Plan changed concurrently", body = crate::error::ErrorResponse)
    )
)]
pub async fn replan_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ReplanRequest>,
) -> AppResult<Json<ScheduleResponse>> {
    let plan = state.services.plans.get(id).await?;
    require_participant(&claims, &plan)?;

    let plan = state.services.plans.replan(id, &request).await?;
    Ok(Json(ScheduleResponse::from(&plan)))
}

/// Pause a plan for a number of weeks
#[utoipa::path(
    post,
    path = "/plans/{id}/pause",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    request_body = PauseRequest,
    responses(
        (status = 200, description = "Plan paused", body = AssignedPlan),
        (status = 400, description = "Invalid pause length"),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Paused too recently, or plan not scheduled", body = crate::error::ErrorResponse)
    )
)]
pub async fn pause_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<PauseRequest>,
) -> AppResult<Json<AssignedPlan>> {
    let plan = state.services.plans.get(id).await?;
    require_participant(&claims, &plan)?;

    let plan = state.services.plans.pause(id, &request).await?;
    Ok(Json(plan))
}

/// Resume a paused plan
#[utoipa::path(
    post,
    path = "/plans/{id}/resume",
    tag = "plans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Plan ID")),
    responses(
        (status = 200, description = "Plan active", body = AssignedPlan),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Plan not scheduled yet", body = crate::error::ErrorResponse)
    )
)]
pub async fn resume_plan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<AssignedPlan>> {
    let plan = state.services.plans.get(id).await?;
    require_participant(&claims, &plan)?;

    let plan = state.services.plans.resume(id).await?;
    Ok(Json(plan))
}

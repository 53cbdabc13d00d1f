//! Availability endpoints: weekly windows and blocked times

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::availability::{
        AvailabilityWindow, BlockedTime, BlockedTimeQuery, CreateBlockedTime, SetAvailability,
    },
    scheduling::dates::parse_optional_date,
    AppState,
};

use super::AuthenticatedUser;

/// Get the weekly availability of a calendar
#[utoipa::path(
    get,
    path = "/calendars/{id}/availability",
    tag = "availability",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Calendar ID")),
    responses(
        (status = 200, description = "Weekly windows", body = Vec<AvailabilityWindow>),
        (status = 404, description = "Calendar not found")
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(calendar_id): Path<i32>,
) -> AppResult<Json<Vec<AvailabilityWindow>>> {
    let calendar = state.services.calendars.get_by_id(calendar_id).await?;
    if !calendar.is_public {
        claims.require_coach_owner(&calendar.coach_id)?;
    }

    let windows = state.services.availability.get_availability(calendar_id).await?;
    Ok(Json(windows))
}

/// Replace the weekly availability of a calendar
#[utoipa::path(
    put,
    path = "/calendars/{id}/availability",
    tag = "availability",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Calendar ID")),
    request_body = SetAvailability,
    responses(
        (status = 200, description = "Stored windows", body = Vec<AvailabilityWindow>),
        (status = 400, description = "A window has start >= end"),
        (status = 403, description = "Not the owning coach"),
        (status = 404, description = "Calendar not found")
    )
)]
pub async fn set_availability(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(calendar_id): Path<i32>,
    Json(data): Json<SetAvailability>,
) -> AppResult<Json<Vec<AvailabilityWindow>>> {
    let calendar = state.services.calendars.get_by_id(calendar_id).await?;
    claims.require_coach_owner(&calendar.coach_id)?;

    let windows = state
        .services
        .availability
        .set_availability(calendar_id, &data.windows)
        .await?;
    Ok(Json(windows))
}

/// List blocked times of a coach
#[utoipa::path(
    get,
    path = "/blocked-times",
    tag = "availability",
    security(("bearer_auth" = [])),
    params(BlockedTimeQuery),
    responses(
        (status = 200, description = "Blocked times", body = Vec<BlockedTime>),
        (status = 403, description = "Not the coach")
    )
)]
pub async fn list_blocked_times(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BlockedTimeQuery>,
) -> AppResult<Json<Vec<BlockedTime>>> {
    let coach_id = claims.resolve_coach_id(query.coach_id.as_deref())?;
    let from = parse_optional_date(query.from.as_deref(), "from")?;

    let blocked = state.services.availability.get_blocked_times(&coach_id, from).await?;
    Ok(Json(blocked))
}

/// Block a date or part of a date across all of a coach's calendars
#[utoipa::path(
    post,
    path = "/blocked-times",
    tag = "availability",
    security(("bearer_auth" = [])),
    request_body = CreateBlockedTime,
    responses(
        (status = 201, description = "Blocked time created", body = BlockedTime),
        (status = 400, description = "Missing or inverted times"),
        (status = 403, description = "Not the coach")
    )
)]
pub async fn create_blocked_time(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBlockedTime>,
) -> AppResult<(StatusCode, Json<BlockedTime>)> {
    let coach_id = claims.resolve_coach_id(data.coach_id.as_deref())?;

    let blocked = state.services.availability.add_blocked_time(&coach_id, &data).await?;
    Ok((StatusCode::CREATED, Json(blocked)))
}

/// Remove a blocked time
#[utoipa::path(
    delete,
    path = "/blocked-times/{id}",
    tag = "availability",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Blocked time ID")),
    responses(
        (status = 204, description = "Blocked time removed"),
        (status = 403, description = "Not the coach"),
        (status = 404, description = "Blocked time not found")
    )
)]
pub async fn delete_blocked_time(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let blocked = state.services.availability.get_blocked_time(id).await?;
    claims.require_coach_owner(&blocked.coach_id)?;

    state.services.availability.remove_blocked_time(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Calendar management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::calendar::{Calendar, CreateCalendar, UpdateCalendar},
    AppState,
};

use super::AuthenticatedUser;

/// Query parameters for listing calendars
#[derive(Debug, Deserialize, IntoParams)]
pub struct CalendarQuery {
    /// Coach ID; defaults to the caller
    pub coach_id: Option<String>,
}

/// List a coach's calendars
///
/// Owners and admins see every calendar, other users only public ones.
#[utoipa::path(
    get,
    path = "/calendars",
    tag = "calendars",
    security(("bearer_auth" = [])),
    params(CalendarQuery),
    responses(
        (status = 200, description = "Calendars of the coach", body = Vec<Calendar>)
    )
)]
pub async fn list_calendars(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<Vec<Calendar>>> {
    let coach_id = query.coach_id.unwrap_or_else(|| claims.sub.clone());
    let owner = claims.require_coach_owner(&coach_id).is_ok();

    let calendars = state.services.calendars.list_by_coach(&coach_id).await?;
    Ok(Json(
        calendars.into_iter().filter(|c| owner || c.is_public).collect(),
    ))
}

/// Create a calendar
#[utoipa::path(
    post,
    path = "/calendars",
    tag = "calendars",
    security(("bearer_auth" = [])),
    request_body = CreateCalendar,
    responses(
        (status = 201, description = "Calendar created", body = Calendar),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Coach account required"),
        (status = 409, description = "Public slug already used")
    )
)]
pub async fn create_calendar(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateCalendar>,
) -> AppResult<(StatusCode, Json<Calendar>)> {
    let coach_id = claims.resolve_coach_id(data.coach_id.as_deref())?;
    let calendar = state.services.calendars.create(&coach_id, &data).await?;
    Ok((StatusCode::CREATED, Json(calendar)))
}

/// Get calendar by ID
#[utoipa::path(
    get,
    path = "/calendars/{id}",
    tag = "calendars",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Calendar ID")),
    responses(
        (status = 200, description = "Calendar details", body = Calendar),
        (status = 404, description = "Calendar not found")
    )
)]
pub async fn get_calendar(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Calendar>> {
    let calendar = state.services.calendars.get_by_id(id).await?;
    if !calendar.is_public {
        claims.require_coach_owner(&calendar.coach_id)?;
    }
    Ok(Json(calendar))
}

/// Get a public calendar by its slug (no authentication)
#[utoipa::path(
    get,
    path = "/calendars/by-slug/{slug}",
    tag = "calendars",
    params(("slug" = String, Path, description = "Public booking slug")),
    responses(
        (status = 200, description = "Calendar details", body = Calendar),
        (status = 404, description = "No public calendar with this slug")
    )
)]
pub async fn get_calendar_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Calendar>> {
    let calendar = state.services.calendars.get_public_by_slug(&slug).await?;
    Ok(Json(calendar))
}

/// Update a calendar
#[utoipa::path(
    put,
    path = "/calendars/{id}",
    tag = "calendars",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Calendar ID")),
    request_body = UpdateCalendar,
    responses(
        (status = 200, description = "Calendar updated", body = Calendar),
        (status = 403, description = "Not the owning coach"),
        (status = 404, description = "Calendar not found"),
        (status = 409, description = "Public slug already used")
    )
)]
pub async fn update_calendar(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateCalendar>,
) -> AppResult<Json<Calendar>> {
    let calendar = state.services.calendars.get_by_id(id).await?;
    claims.require_coach_owner(&calendar.coach_id)?;

    let calendar = state.services.calendars.update(id, &data).await?;
    Ok(Json(calendar))
}

/// Delete a calendar with its windows and bookings
#[utoipa::path(
    delete,
    path = "/calendars/{id}",
    tag = "calendars",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Calendar ID")),
    responses(
        (status = 204, description = "Calendar deleted"),
        (status = 403, description = "Not the owning coach"),
        (status = 404, description = "Calendar not found")
    )
)]
pub async fn delete_calendar(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let calendar = state.services.calendars.get_by_id(id).await?;
    claims.require_coach_owner(&calendar.coach_id)?;

    state.services.calendars.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

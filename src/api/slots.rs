//! Bookable slot endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    scheduling::{dates::parse_date, Slot},
    AppState,
};

use super::OptionalUser;

/// Query parameters for slot listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotQuery {
    pub calendar_id: i32,
    /// First date (YYYY-MM-DD)
    pub from: String,
    /// Last date, inclusive (YYYY-MM-DD)
    pub to: String,
}

/// List bookable slots of a calendar
///
/// Public calendars can be queried anonymously.
#[utoipa::path(
    get,
    path = "/slots",
    tag = "bookings",
    params(SlotQuery),
    responses(
        (status = 200, description = "Open slots ordered by date and time", body = Vec<Slot>),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Private calendar needs authentication"),
        (status = 404, description = "Calendar not found")
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    OptionalUser(claims): OptionalUser,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<Vec<Slot>>> {
    let from = parse_date(&query.from, "from")?;
    let to = parse_date(&query.to, "to")?;

    let calendar = state.services.calendars.get_by_id(query.calendar_id).await?;
    if !calendar.is_public && claims.is_none() {
        return Err(AppError::Authentication(
            "This calendar requires authentication".to_string(),
        ));
    }

    let slots = state.services.slots.list_slots(calendar.id, from, to).await?;
    Ok(Json(slots))
}

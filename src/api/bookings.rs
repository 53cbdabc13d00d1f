//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingAction, BookingQuery, CreateBooking, UpdateBookingStatus},
        calendar::Calendar,
        user::UserClaims,
    },
    scheduling::dates::parse_optional_date,
    AppState,
};

use super::{AuthenticatedUser, OptionalUser};

/// The booking's coach, the athlete who booked it, or an admin
fn require_booking_access(claims: &UserClaims, booking: &Booking, calendar: &Calendar) -> AppResult<()> {
    if claims.require_coach_owner(&calendar.coach_id).is_ok()
        || booking.athlete_id.as_deref() == Some(claims.sub.as_str())
    {
        Ok(())
    } else {
        Err(AppError::Authorization("Not allowed to access this booking".to_string()))
    }
}

/// Book a slot
///
/// Public calendars accept anonymous bookers. The booking starts PENDING.
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Private calendar needs authentication"),
        (status = 404, description = "Calendar not found"),
        (status = 409, description = "Slot unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    OptionalUser(claims): OptionalUser,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let calendar = state.services.calendars.get_by_id(request.calendar_id).await?;
    if !calendar.is_public && claims.is_none() {
        return Err(AppError::Authentication(
            "This calendar requires authentication".to_string(),
        ));
    }

    let athlete_id = claims.as_ref().map(|c| c.sub.as_str());
    let booking = state.services.bookings.create_booking(&request, athlete_id).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get booking by ID
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = Booking),
        (status = 403, description = "Not the coach or booker"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let (booking, calendar) = state.services.bookings.get_with_calendar(id).await?;
    require_booking_access(&claims, &booking, &calendar)?;
    Ok(Json(booking))
}

/// Apply a status action to a booking
///
/// Coaches may confirm, cancel and complete; the athlete who booked may only
/// cancel.
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingStatus,
    responses(
        (status = 200, description = "Updated booking", body = Booking),
        (status = 403, description = "Action not allowed for caller"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_booking_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatus>,
) -> AppResult<Json<Booking>> {
    request.validate()?;
    let (booking, calendar) = state.services.bookings.get_with_calendar(id).await?;
    match request.action {
        BookingAction::Cancel => require_booking_access(&claims, &booking, &calendar)?,
        BookingAction::Confirm | BookingAction::Complete => {
            claims.require_coach_owner(&calendar.coach_id)?
        }
    }

    let bookings = &state.services.bookings;
    let updated = match request.action {
        BookingAction::Confirm => bookings.confirm_booking(id).await?,
        BookingAction::Cancel => bookings.cancel_booking(id, request.reason.as_deref()).await?,
        BookingAction::Complete => bookings.complete_booking(id).await?,
    };
    Ok(Json(updated))
}

/// List bookings of a calendar
#[utoipa::path(
    get,
    path = "/calendars/{id}/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Calendar ID"), BookingQuery),
    responses(
        (status = 200, description = "Bookings ordered by date and time", body = Vec<Booking>),
        (status = 403, description = "Not the owning coach"),
        (status = 404, description = "Calendar not found")
    )
)]
pub async fn list_calendar_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(calendar_id): Path<i32>,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let calendar = state.services.calendars.get_by_id(calendar_id).await?;
    claims.require_coach_owner(&calendar.coach_id)?;

    let from = parse_optional_date(query.from.as_deref(), "from")?;
    let to = parse_optional_date(query.to.as_deref(), "to")?;
    let bookings = state
        .services
        .bookings
        .list(calendar_id, from, to, query.status)
        .await?;
    Ok(Json(bookings))
}

//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availability, bookings, calendars, events, health, plans, slots};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coachbook API",
        version = "1.0.0",
        description = "Coach calendars, bookings and training plan scheduling REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Calendars
        calendars::list_calendars,
        calendars::create_calendar,
        calendars::get_calendar,
        calendars::get_calendar_by_slug,
        calendars::update_calendar,
        calendars::delete_calendar,
        // Availability
        availability::get_availability,
        availability::set_availability,
        availability::list_blocked_times,
        availability::create_blocked_time,
        availability::delete_blocked_time,
        // Bookings
        slots::list_slots,
        bookings::create_booking,
        bookings::get_booking,
        bookings::update_booking_status,
        bookings::list_calendar_bookings,
        // Plans
        plans::create_plan,
        plans::list_plans,
        plans::get_plan,
        plans::schedule_plan,
        plans::replan_plan,
        plans::pause_plan,
        plans::resume_plan,
        // Events
        events::stream_events,
    ),
    components(
        schemas(
            // Calendars
            crate::models::calendar::Calendar,
            crate::models::calendar::CreateCalendar,
            crate::models::calendar::UpdateCalendar,
            // Availability
            crate::models::availability::AvailabilityWindow,
            crate::models::availability::AvailabilityWindowInput,
            crate::models::availability::SetAvailability,
            crate::models::availability::BlockedTime,
            crate::models::availability::CreateBlockedTime,
            // Bookings
            crate::scheduling::Slot,
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::BookingAction,
            crate::models::booking::CreateBooking,
            crate::models::booking::UpdateBookingStatus,
            // Plans
            crate::models::plan::AssignedPlan,
            crate::models::plan::ScheduleStatus,
            crate::models::plan::PlanWeek,
            crate::models::plan::PlanSession,
            crate::models::plan::CreatePlan,
            crate::models::plan::ScheduleRequest,
            crate::models::plan::ReplanRequest,
            crate::models::plan::PauseRequest,
            crate::models::plan::ScheduleResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "calendars", description = "Coach calendar management"),
        (name = "availability", description = "Weekly availability and blocked times"),
        (name = "bookings", description = "Slots and bookings"),
        (name = "plans", description = "Training plan scheduling"),
        (name = "events", description = "Domain event stream")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

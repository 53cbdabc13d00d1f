//! Domain events emitted by scheduling operations

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::booking::Booking;

/// Something that happened, for notification collaborators to react to
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingCreated { coach_id: String, booking: Booking },
    BookingConfirmed { coach_id: String, booking: Booking },
    BookingCancelled { coach_id: String, booking: Booking },
    BookingCompleted { coach_id: String, booking: Booking },
    PlanScheduled {
        plan_id: i32,
        athlete_id: String,
        coach_id: Option<String>,
        replanned: bool,
    },
    PlanPaused {
        plan_id: i32,
        athlete_id: String,
        coach_id: Option<String>,
        pause_until: DateTime<Utc>,
    },
    PlanResumed {
        plan_id: i32,
        athlete_id: String,
        coach_id: Option<String>,
    },
}

impl DomainEvent {
    /// Coach concerned by the event, if any
    pub fn coach_id(&self) -> Option<&str> {
        match self {
            DomainEvent::BookingCreated { coach_id, .. }
            | DomainEvent::BookingConfirmed { coach_id, .. }
            | DomainEvent::BookingCancelled { coach_id, .. }
            | DomainEvent::BookingCompleted { coach_id, .. } => Some(coach_id),
            DomainEvent::PlanScheduled { coach_id, .. }
            | DomainEvent::PlanPaused { coach_id, .. }
            | DomainEvent::PlanResumed { coach_id, .. } => coach_id.as_deref(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated { .. } => "booking_created",
            DomainEvent::BookingConfirmed { .. } => "booking_confirmed",
            DomainEvent::BookingCancelled { .. } => "booking_cancelled",
            DomainEvent::BookingCompleted { .. } => "booking_completed",
            DomainEvent::PlanScheduled { .. } => "plan_scheduled",
            DomainEvent::PlanPaused { .. } => "plan_paused",
            DomainEvent::PlanResumed { .. } => "plan_resumed",
        }
    }
}

/// Event with delivery metadata
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}

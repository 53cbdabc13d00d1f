//! Data models for Coachbook

pub mod availability;
pub mod booking;
pub mod calendar;
pub mod event;
pub mod plan;
pub mod user;

// Re-export commonly used types
pub use availability::{AvailabilityWindow, BlockedTime};
pub use booking::{Booking, BookingAction, BookingStatus};
pub use calendar::Calendar;
pub use event::{DomainEvent, EventEnvelope};
pub use plan::{AssignedPlan, PlanSession, PlanWeek, ScheduleStatus};
pub use user::{Role, UserClaims};

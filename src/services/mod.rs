//! Business logic services

pub mod availability;
pub mod bookings;
pub mod calendars;
pub mod events;
pub mod plans;
pub mod redis;
pub mod slots;

use crate::{config::SchedulingConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub calendars: calendars::CalendarsService,
    pub availability: availability::AvailabilityService,
    pub slots: slots::SlotsService,
    pub bookings: bookings::BookingsService,
    pub plans: plans::PlansService,
    pub events: events::EventBus,
}

impl Services {
    /// Create all services with the given repository and event bus
    pub fn new(repository: Repository, events: events::EventBus, scheduling: &SchedulingConfig) -> Self {
        Self {
            calendars: calendars::CalendarsService::new(repository.clone()),
            availability: availability::AvailabilityService::new(repository.clone()),
            slots: slots::SlotsService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone(), events.clone()),
            plans: plans::PlansService::new(repository, events.clone(), scheduling),
            events,
        }
    }
}

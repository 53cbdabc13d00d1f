//! Repository layer for database operations

pub mod availability;
pub mod bookings;
pub mod calendars;
pub mod plans;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub calendars: calendars::CalendarsRepository,
    pub availability: availability::AvailabilityRepository,
    pub bookings: bookings::BookingsRepository,
    pub plans: plans::PlansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            calendars: calendars::CalendarsRepository::new(pool.clone()),
            availability: availability::AvailabilityRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            plans: plans::PlansRepository::new(pool.clone()),
            pool,
        }
    }
}

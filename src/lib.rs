//! Coachbook scheduling server
//!
//! REST JSON API for coach calendars, athlete bookings and training plan
//! scheduling. The pure scheduling rules live in [`scheduling`]; everything
//! else is plumbing around a Postgres store.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduling;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}

//! Coachbook Server - coach scheduling API
//!
//! Calendars, bookings and training plan scheduling over a REST JSON API.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coachbook_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{events::EventBus, redis::RedisPublisher, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    init_tracing(&config.logging);

    tracing::info!("Starting Coachbook Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    // Domain events: in-process bus, optionally forwarded to Redis
    let events = EventBus::new(config.scheduling.event_buffer);
    match &config.redis.url {
        Some(url) => match RedisPublisher::connect(url, &config.redis.channel).await {
            Ok(publisher) => {
                events.forward_to(Arc::new(publisher));
                tracing::info!(channel = %config.redis.channel, "Forwarding domain events to Redis");
            }
            // Notifications are best effort; scheduling keeps working without them
            Err(e) => tracing::warn!("Redis unavailable, domain events stay in-process: {}", e),
        },
        None => tracing::info!("No Redis URL configured, domain events stay in-process"),
    }

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, events, &config.scheduling);

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(server_host.parse()?, server_port);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("coachbook_server={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Calendars
        .route(
            "/calendars",
            get(api::calendars::list_calendars).post(api::calendars::create_calendar),
        )
        .route("/calendars/by-slug/:slug", get(api::calendars::get_calendar_by_slug))
        .route(
            "/calendars/:id",
            get(api::calendars::get_calendar)
                .put(api::calendars::update_calendar)
                .delete(api::calendars::delete_calendar),
        )
        .route(
            "/calendars/:id/availability",
            get(api::availability::get_availability).put(api::availability::set_availability),
        )
        .route("/calendars/:id/bookings", get(api::bookings::list_calendar_bookings))
        // Blocked times
        .route(
            "/blocked-times",
            get(api::availability::list_blocked_times).post(api::availability::create_blocked_time),
        )
        .route("/blocked-times/:id", delete(api::availability::delete_blocked_time))
        // Slots and bookings
        .route("/slots", get(api::slots::list_slots))
        .route("/bookings", post(api::bookings::create_booking))
        .route(
            "/bookings/:id",
            get(api::bookings::get_booking).patch(api::bookings::update_booking_status),
        )
        // Plans
        .route("/plans", get(api::plans::list_plans).post(api::plans::create_plan))
        .route("/plans/:id", get(api::plans::get_plan))
        .route("/plans/:id/schedule", post(api::plans::schedule_plan))
        .route("/plans/:id/replan", post(api::plans::replan_plan))
        .route("/plans/:id/pause", post(api::plans::pause_plan))
        .route("/plans/:id/resume", post(api::plans::resume_plan))
        // Events
        .route("/events/stream", get(api::events::stream_events))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
}

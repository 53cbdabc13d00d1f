//! Server-sent event stream of domain events for coaches

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{error::AppResult, services::events::concerns_coach, AppState};

use super::AuthenticatedUser;

/// Stream the caller's booking and plan events
///
/// Each SSE message is named after the event type and carries the event as
/// JSON. Events missed while the client lagged are skipped.
#[utoipa::path(
    get,
    path = "/events/stream",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "text/event-stream of domain events"),
        (status = 403, description = "Coach account required")
    )
)]
pub async fn stream_events(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    claims.require_coach()?;
    let coach_id = claims.sub.clone();
    tracing::debug!(coach_id = %coach_id, "Event stream opened");

    let stream = BroadcastStream::new(state.services.events.subscribe()).filter_map(move |item| {
        let envelope = match item {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(coach_id = %coach_id, "Event stream lagged: {}", e);
                return None;
            }
        };
        if !concerns_coach(&envelope, &coach_id) {
            return None;
        }
        match Event::default()
            .event(envelope.event.name())
            .id(envelope.id.to_string())
            .json_data(&envelope)
        {
            Ok(event) => Some(Ok::<_, Infallible>(event)),
            Err(e) => {
                tracing::warn!(event_id = %envelope.id, "Failed to encode event: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

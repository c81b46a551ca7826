//! Server-sent event stream of change events.
//!
//! Browser tabs subscribe to the topics they display and refetch when an
//! event arrives. The actor's own events are filtered out.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use repairdesk_worker::broadcast::event_stream;
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt};

use crate::{ApiState, middleware::actor::MaybeActor};

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Comma-separated topics; all topics when absent
    pub topics: Option<String>,
}

pub async fn stream_events(
    State(state): State<Arc<ApiState>>,
    actor: MaybeActor,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let topics: Vec<String> = query
        .topics
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!(actor = ?actor.id(), ?topics, "Event stream opened");

    let events = event_stream(
        state.hub.subscribe(actor.id(), topics),
        state.shutdown.clone(),
    );
    let stream = events.map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event(event.name).data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

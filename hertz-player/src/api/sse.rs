//! Server-Sent Events stream
//!
//! Streams session events to connected clients, optionally for one guild.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use hertz_common::GuildId;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct EventFilter {
    /// Only forward events for this guild
    pub guild_id: Option<u64>,
}

/// GET /events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guild_filter = filter.guild_id.map(GuildId);
    debug!(guild = ?guild_filter, "New SSE client connected");

    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) => {
                if guild_filter.is_some_and(|guild| guild != event.guild_id()) {
                    return None;
                }
                match serde_json::to_string(&event) {
                    Ok(json) => Some(Ok(Event::default().event(event.event_type()).data(json))),
                    Err(e) => {
                        warn!("Failed to serialize event: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                // Lagged subscriber; the missed events are gone
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

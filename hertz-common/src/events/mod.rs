//! Event types for the Hertz event system
//!
//! Provides the shared event definitions and EventBus used to fan session
//! notifications out to SSE clients and other listeners.

mod session_types;

pub use session_types::{CompletionOutcome, SessionState};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::track::{GuildId, Track};

/// Hertz event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// Every event carries the guild it belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum HertzEvent {
    /// Track appended to a guild's queue
    TrackAdded {
        guild_id: GuildId,
        track: Track,
        /// 1-based queue position at the time of the add
        position: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Driver acknowledged the start of a track
    NowPlaying {
        guild_id: GuildId,
        track: Track,
        /// Session volume (0.0-1.0)
        volume: f32,
        loop_enabled: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Track removed from a guild's queue by position
    TrackRemoved {
        guild_id: GuildId,
        track: Track,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User-displayable playback error
    PlaybackError {
        guild_id: GuildId,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl HertzEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            HertzEvent::TrackAdded { .. } => "TrackAdded",
            HertzEvent::NowPlaying { .. } => "NowPlaying",
            HertzEvent::TrackRemoved { .. } => "TrackRemoved",
            HertzEvent::PlaybackError { .. } => "PlaybackError",
        }
    }

    /// Guild the event belongs to
    pub fn guild_id(&self) -> GuildId {
        match self {
            HertzEvent::TrackAdded { guild_id, .. }
            | HertzEvent::NowPlaying { guild_id, .. }
            | HertzEvent::TrackRemoved { guild_id, .. }
            | HertzEvent::PlaybackError { guild_id, .. } => *guild_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use hertz_common::events::{EventBus, HertzEvent};
/// use hertz_common::GuildId;
///
/// let event_bus = EventBus::new(64);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(HertzEvent::PlaybackError {
///     guild_id: GuildId(1),
///     message: "Failed to join voice".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// let event = rx.try_recv().unwrap();
/// assert_eq!(event.event_type(), "PlaybackError");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HertzEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging subscribers
    ///   start losing the oldest ones
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<HertzEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: HertzEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{Requester, ResolvedTrack, TrackOrigin};

    fn track(id: &str) -> Track {
        ResolvedTrack {
            id: id.to_string(),
            title: format!("Track {}", id),
            source_page_url: String::new(),
            stream_url: format!("https://cdn.example.com/{}", id),
            duration_secs: 200,
            thumbnail_url: None,
            artist: None,
            album: None,
            origin: TrackOrigin::DirectStream,
        }
        .requested_by(Requester::new("tester"))
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.subscriber_count(), 0);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_eventbus_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit_lossy(HertzEvent::PlaybackError {
            guild_id: GuildId(1),
            message: "boom".to_string(),
            timestamp: chrono::Utc::now(),
        });

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = HertzEvent::TrackAdded {
            guild_id: GuildId(9),
            track: track("a"),
            position: 1,
            timestamp: chrono::Utc::now(),
        };
        bus.emit_lossy(event);

        assert_eq!(rx1.try_recv().unwrap().event_type(), "TrackAdded");
        assert_eq!(rx2.try_recv().unwrap().guild_id(), GuildId(9));
    }

    #[test]
    fn test_eventbus_emit_lossy_on_full_channel() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();

        for i in 0..10 {
            bus.emit_lossy(HertzEvent::PlaybackError {
                guild_id: GuildId(i),
                message: format!("error {}", i),
                timestamp: chrono::Utc::now(),
            });
        }

        // Only the newest two survive
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(8))
        ));
        assert_eq!(rx.try_recv().unwrap().guild_id(), GuildId(8));
        assert_eq!(rx.try_recv().unwrap().guild_id(), GuildId(9));
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = HertzEvent::NowPlaying {
            guild_id: GuildId(5),
            track: track("b"),
            volume: 0.5,
            loop_enabled: true,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NowPlaying");
        assert_eq!(json["guild_id"], 5);
        assert_eq!(json["track"]["id"], "b");
        assert_eq!(json["loop_enabled"], true);
    }
}

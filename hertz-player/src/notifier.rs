//! Session notifications
//!
//! Sessions report state changes to a [`Notifier`] and never format
//! anything themselves. A failed notification is logged by the session and
//! otherwise ignored.

use anyhow::Result;
use hertz_common::events::{EventBus, HertzEvent};
use hertz_common::human_time::format_volume_percent;
use hertz_common::time;
use hertz_common::{GuildId, Track};
use std::sync::Arc;
use tracing::{info, warn};

/// Receiver of session state changes
///
/// Called from the session actor, so implementations must not block.
pub trait Notifier: Send + Sync {
    /// Track appended at a 1-based queue position
    fn added(&self, guild: GuildId, track: &Track, position: usize) -> Result<()>;

    /// Driver acknowledged the start of a track
    fn now_playing(&self, guild: GuildId, track: &Track, volume: f32, loop_enabled: bool)
        -> Result<()>;

    /// User-displayable failure
    fn error(&self, guild: GuildId, message: &str) -> Result<()>;

    /// Track removed from the queue by position
    fn removed(&self, guild: GuildId, track: &Track) -> Result<()>;
}

/// Publishes notifications as [`HertzEvent`]s
#[derive(Clone)]
pub struct EventNotifier {
    events: EventBus,
}

impl EventNotifier {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }
}

impl Notifier for EventNotifier {
    fn added(&self, guild: GuildId, track: &Track, position: usize) -> Result<()> {
        self.events.emit_lossy(HertzEvent::TrackAdded {
            guild_id: guild,
            track: track.clone(),
            position,
            timestamp: time::now(),
        });
        Ok(())
    }

    fn now_playing(
        &self,
        guild: GuildId,
        track: &Track,
        volume: f32,
        loop_enabled: bool,
    ) -> Result<()> {
        self.events.emit_lossy(HertzEvent::NowPlaying {
            guild_id: guild,
            track: track.clone(),
            volume,
            loop_enabled,
            timestamp: time::now(),
        });
        Ok(())
    }

    fn error(&self, guild: GuildId, message: &str) -> Result<()> {
        self.events.emit_lossy(HertzEvent::PlaybackError {
            guild_id: guild,
            message: message.to_string(),
            timestamp: time::now(),
        });
        Ok(())
    }

    fn removed(&self, guild: GuildId, track: &Track) -> Result<()> {
        self.events.emit_lossy(HertzEvent::TrackRemoved {
            guild_id: guild,
            track: track.clone(),
            timestamp: time::now(),
        });
        Ok(())
    }
}

/// Renders notifications as log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn added(&self, guild: GuildId, track: &Track, position: usize) -> Result<()> {
        info!(
            guild = %guild,
            position,
            "Added to queue: {} [{}] (requested by {})",
            track,
            track.display_duration(),
            track.requested_by().display_name
        );
        Ok(())
    }

    fn now_playing(
        &self,
        guild: GuildId,
        track: &Track,
        volume: f32,
        loop_enabled: bool,
    ) -> Result<()> {
        info!(
            guild = %guild,
            volume = %format_volume_percent(volume),
            loop_enabled,
            "Now playing: {} [{}]",
            track,
            track.display_duration()
        );
        Ok(())
    }

    fn error(&self, guild: GuildId, message: &str) -> Result<()> {
        warn!(guild = %guild, "Playback error: {}", message);
        Ok(())
    }

    fn removed(&self, guild: GuildId, track: &Track) -> Result<()> {
        info!(guild = %guild, "Removed from queue: {}", track);
        Ok(())
    }
}

/// Fans each notification out to several notifiers
///
/// Every notifier is called even if an earlier one fails; the first failure
/// is returned.
#[derive(Clone, Default)]
pub struct CompositeNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    fn each(&self, mut call: impl FnMut(&dyn Notifier) -> Result<()>) -> Result<()> {
        let mut first_error = None;
        for notifier in &self.notifiers {
            if let Err(e) = call(notifier.as_ref()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Notifier for CompositeNotifier {
    fn added(&self, guild: GuildId, track: &Track, position: usize) -> Result<()> {
        self.each(|n| n.added(guild, track, position))
    }

    fn now_playing(
        &self,
        guild: GuildId,
        track: &Track,
        volume: f32,
        loop_enabled: bool,
    ) -> Result<()> {
        self.each(|n| n.now_playing(guild, track, volume, loop_enabled))
    }

    fn error(&self, guild: GuildId, message: &str) -> Result<()> {
        self.each(|n| n.error(guild, message))
    }

    fn removed(&self, guild: GuildId, track: &Track) -> Result<()> {
        self.each(|n| n.removed(guild, track))
    }
}

//! Music command surface
//!
//! Thin layer between a chat front end (or the HTTP API) and the sessions:
//! resolves queries, attaches the requester, converts user-facing units and
//! forwards to the guild's session.

use hertz_common::{GuildId, Requester, Track};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::registry::SessionRegistry;
use crate::resolver::TrackResolver;
use crate::session::{NowPlaying, QueuePage};
use crate::{Error, Result};

/// Result of a successful play command
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueReceipt {
    /// 1-based position the track was added at
    pub position: usize,
    pub track: Track,
}

#[derive(Clone)]
pub struct MusicCommands {
    registry: Arc<SessionRegistry>,
    resolver: Arc<dyn TrackResolver>,
}

impl MusicCommands {
    pub fn new(registry: Arc<SessionRegistry>, resolver: Arc<dyn TrackResolver>) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Resolve a query and enqueue the result
    ///
    /// Resolution failures leave the session untouched.
    pub async fn play(
        &self,
        guild: GuildId,
        query: &str,
        requester: Requester,
    ) -> Result<EnqueueReceipt> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidArgument("Please provide a song name or URL".to_string()));
        }

        let track = self.resolver.resolve(query).await?.requested_by(requester);
        info!(guild = %guild, track = %track, "Play requested");

        let session = self.registry.get_or_create(guild).await;
        let position = session.enqueue(track.clone()).await?;
        Ok(EnqueueReceipt { position, track })
    }

    pub async fn skip(&self, guild: GuildId) -> Result<Track> {
        self.registry.get_or_create(guild).await.skip().await
    }

    /// Remove the queued track at a 1-based position
    pub async fn remove(&self, guild: GuildId, position: usize) -> Result<Track> {
        self.registry.get_or_create(guild).await.remove(position).await
    }

    /// Set volume from a 0-100 percentage, returning the applied percentage
    pub async fn set_volume(&self, guild: GuildId, percent: i64) -> Result<u8> {
        let percent = percent.clamp(0, 100);
        let applied = self
            .registry
            .get_or_create(guild)
            .await
            .set_volume(percent as f32 / 100.0)
            .await?;
        Ok((applied * 100.0).round() as u8)
    }

    pub async fn set_loop(&self, guild: GuildId, enabled: bool) -> Result<bool> {
        self.registry.get_or_create(guild).await.set_loop(enabled).await
    }

    /// One 1-based page of the queue listing
    pub async fn queue(&self, guild: GuildId, page: usize) -> Result<QueuePage> {
        self.registry.get_or_create(guild).await.show_queue(page).await
    }

    pub async fn now_playing(&self, guild: GuildId) -> Result<NowPlaying> {
        self.registry.get_or_create(guild).await.now_playing().await
    }

    pub async fn disconnect(&self, guild: GuildId) -> Result<()> {
        self.registry.get_or_create(guild).await.disconnect().await
    }
}

//! Per-guild playback session
//!
//! A [`PlaybackSession`] is a cheap, cloneable handle to a session actor.
//! The actor task owns the queue, the current track, volume, loop flag and
//! state, and processes commands and driver completion signals one at a
//! time from a single FIFO channel. Every operation is therefore atomic with
//! respect to every other operation on the same guild.

mod actor;
mod queue;
mod state;

pub use queue::{TrackQueue, QUEUE_PAGE_SIZE};
pub use state::{NowPlaying, QueueEntry, QueuePage, SessionSnapshot};

use hertz_common::config::PlaybackConfig;
use hertz_common::events::CompletionOutcome;
use hertz_common::time::secs_to_duration;
use hertz_common::{GuildId, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::driver::{PlaybackDriver, RenderId};
use crate::notifier::Notifier;
use crate::{Error, Result};
use actor::SessionActor;

/// Session tuning taken from `[playback]` configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Volume a new session starts with (0.0-1.0)
    pub default_volume: f32,
    /// Upper bound on waiting for a driver start acknowledgement
    pub start_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for SessionConfig {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            default_volume: config.default_volume.clamp(0.0, 1.0),
            start_timeout: secs_to_duration(config.start_timeout_secs),
        }
    }
}

/// Messages processed by the session actor, in arrival order
#[derive(Debug)]
pub(crate) enum SessionMessage {
    Enqueue {
        track: Track,
        reply: oneshot::Sender<usize>,
    },
    Skip {
        reply: oneshot::Sender<Result<Track>>,
    },
    Remove {
        position: usize,
        reply: oneshot::Sender<Result<Track>>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<f32>,
    },
    SetLoop {
        enabled: bool,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    /// Driver report for one render
    Completion {
        render: RenderId,
        outcome: CompletionOutcome,
    },
    /// Stop the actor after tearing down playback
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to one guild's playback session
#[derive(Clone)]
pub struct PlaybackSession {
    guild: GuildId,
    tx: mpsc::UnboundedSender<SessionMessage>,
    disconnect_epoch: Arc<watch::Sender<u64>>,
}

impl PlaybackSession {
    /// Spawn the session actor on the current tokio runtime
    pub fn spawn(
        guild: GuildId,
        driver: Arc<dyn PlaybackDriver>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (epoch_tx, epoch_rx) = watch::channel(0u64);

        let actor = SessionActor::new(guild, driver, notifier, config, tx.downgrade(), epoch_rx);
        tokio::spawn(actor.run(rx));

        debug!(guild = %guild, "Spawned playback session");

        Self {
            guild,
            tx,
            disconnect_epoch: Arc::new(epoch_tx),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild
    }

    /// Append a track; starts playback when the session is idle
    ///
    /// Returns the 1-based queue position the track was added at. Start
    /// failures are reported through the notifier, not here.
    pub async fn enqueue(&self, track: Track) -> Result<usize> {
        self.request(|reply| SessionMessage::Enqueue { track, reply }).await
    }

    /// Stop the current track; the next one starts from its completion
    ///
    /// Returns the skipped track.
    pub async fn skip(&self) -> Result<Track> {
        self.request(|reply| SessionMessage::Skip { reply }).await?
    }

    /// Remove the queued track at a 1-based position
    pub async fn remove(&self, position: usize) -> Result<Track> {
        self.request(|reply| SessionMessage::Remove { position, reply })
            .await?
    }

    /// Set volume (clamped to 0.0-1.0), returning the applied level
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        self.request(|reply| SessionMessage::SetVolume { volume, reply })
            .await
    }

    pub async fn set_loop(&self, enabled: bool) -> Result<bool> {
        self.request(|reply| SessionMessage::SetLoop { enabled, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| SessionMessage::Snapshot { reply }).await
    }

    /// One page (1-based) of the queue listing
    pub async fn show_queue(&self, page: usize) -> Result<QueuePage> {
        self.snapshot().await?.queue_page(page)
    }

    pub async fn now_playing(&self) -> Result<NowPlaying> {
        self.snapshot().await?.now_playing()
    }

    /// Stop playback and clear the queue
    ///
    /// A start the actor is currently waiting on is abandoned immediately
    /// rather than after the driver answers.
    pub async fn disconnect(&self) -> Result<()> {
        self.disconnect_epoch.send_modify(|epoch| *epoch += 1);
        self.request(|reply| SessionMessage::Disconnect { reply }).await
    }

    /// Tear down playback and stop the actor
    pub(crate) async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(SessionMessage::Shutdown { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Whether two handles refer to the same actor
    pub fn same_session(&self, other: &PlaybackSession) -> bool {
        self.tx.same_channel(&other.tx)
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(message(reply))
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("guild", &self.guild)
            .field("closed", &self.is_closed())
            .finish()
    }
}

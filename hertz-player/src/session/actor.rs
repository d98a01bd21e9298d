//! Session actor: the per-guild playback state machine

use hertz_common::events::{CompletionOutcome, SessionState};
use hertz_common::{GuildId, Track};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::queue::TrackQueue;
use super::state::SessionSnapshot;
use super::{SessionConfig, SessionMessage};
use crate::driver::{CompletionHandle, DriverError, PlaybackDriver, RenderId};
use crate::notifier::Notifier;
use crate::{Error, Result};

/// Result of asking the driver to start one track
enum StartOutcome {
    Started,
    Failed(DriverError),
    /// Abandoned because a disconnect arrived while waiting
    Cancelled,
}

pub(super) struct SessionActor {
    guild: GuildId,
    driver: Arc<dyn PlaybackDriver>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,

    /// Source for completion handles; weak so idle sessions do not keep
    /// their own channel open
    self_tx: mpsc::WeakUnboundedSender<SessionMessage>,
    disconnect_rx: watch::Receiver<u64>,

    queue: TrackQueue,
    current: Option<Track>,
    volume: f32,
    loop_enabled: bool,
    state: SessionState,

    next_render: u64,
    active_render: Option<RenderId>,
}

impl SessionActor {
    pub(super) fn new(
        guild: GuildId,
        driver: Arc<dyn PlaybackDriver>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
        self_tx: mpsc::WeakUnboundedSender<SessionMessage>,
        disconnect_rx: watch::Receiver<u64>,
    ) -> Self {
        Self {
            guild,
            driver,
            notifier,
            volume: config.default_volume,
            config,
            self_tx,
            disconnect_rx,
            queue: TrackQueue::new(),
            current: None,
            loop_enabled: false,
            state: SessionState::Idle,
            next_render: 0,
            active_render: None,
        }
    }

    pub(super) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionMessage>) {
        info!(guild = %self.guild, "Playback session started");

        let mut shutdown_reply = None;
        while let Some(message) = rx.recv().await {
            if let SessionMessage::Shutdown { reply } = message {
                self.teardown().await;
                shutdown_reply = Some(reply);
                break;
            }
            self.handle(message).await;
        }

        // Close the channel before acknowledging so handles observe it closed
        drop(rx);
        info!(guild = %self.guild, "Playback session stopped");

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    async fn handle(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Enqueue { track, reply } => {
                let position = self.enqueue(track).await;
                let _ = reply.send(position);
            }
            SessionMessage::Skip { reply } => {
                let result = self.skip().await;
                let _ = reply.send(result);
            }
            SessionMessage::Remove { position, reply } => {
                let _ = reply.send(self.remove(position));
            }
            SessionMessage::SetVolume { volume, reply } => {
                let applied = self.set_volume(volume).await;
                let _ = reply.send(applied);
            }
            SessionMessage::SetLoop { enabled, reply } => {
                self.loop_enabled = enabled;
                debug!(guild = %self.guild, enabled, "Loop updated");
                let _ = reply.send(enabled);
            }
            SessionMessage::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionMessage::Disconnect { reply } => {
                self.disconnect().await;
                let _ = reply.send(());
            }
            SessionMessage::Completion { render, outcome } => {
                self.on_completion(render, outcome).await;
            }
            SessionMessage::Shutdown { .. } => {
                // Intercepted by the run loop
            }
        }
    }

    async fn enqueue(&mut self, track: Track) -> usize {
        let position = self.queue.push_back(track.clone());
        debug!(guild = %self.guild, track = %track, position, "Track enqueued");
        self.notify("added", self.notifier.added(self.guild, &track, position));

        if self.state.is_idle() {
            self.advance(None).await;
        }
        position
    }

    async fn skip(&mut self) -> Result<Track> {
        if self.state != SessionState::Playing {
            return Err(Error::NothingPlaying);
        }
        let track = self.current.clone().ok_or(Error::NothingPlaying)?;

        // The stop produces a completion, which advances
        self.driver.stop().await.map_err(|e| {
            error!(guild = %self.guild, error = %e, "Driver rejected stop on skip");
            Error::from(e)
        })?;

        info!(guild = %self.guild, track = %track, "Skipped");
        Ok(track)
    }

    fn remove(&mut self, position: usize) -> Result<Track> {
        let track = self.queue.remove(position)?;
        debug!(guild = %self.guild, track = %track, position, "Track removed");
        self.notify("removed", self.notifier.removed(self.guild, &track));
        Ok(track)
    }

    async fn set_volume(&mut self, requested: f32) -> f32 {
        let volume = if requested.is_finite() {
            requested.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.volume = volume;

        if self.state == SessionState::Playing {
            if let Err(e) = self.driver.set_volume(volume).await {
                error!(guild = %self.guild, error = %e, "Failed to apply live volume");
            }
        }
        debug!(guild = %self.guild, volume, "Volume updated");
        volume
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            guild_id: self.guild,
            state: self.state,
            current: self.current.clone(),
            queue: self.queue.to_vec(),
            volume: self.volume,
            loop_enabled: self.loop_enabled,
        }
    }

    async fn disconnect(&mut self) {
        // Consume the epoch bump that announced this message
        self.disconnect_rx.borrow_and_update();

        if self.current.is_some() {
            if let Err(e) = self.driver.stop().await {
                warn!(guild = %self.guild, error = %e, "Driver stop failed during disconnect");
            }
        }
        let dropped = self.queue.len();
        self.queue.clear();
        self.settle_idle();

        info!(guild = %self.guild, dropped, "Disconnected, queue cleared");
    }

    async fn teardown(&mut self) {
        if self.current.is_some() {
            if let Err(e) = self.driver.stop().await {
                warn!(guild = %self.guild, error = %e, "Driver stop failed during shutdown");
            }
        }
        self.queue.clear();
        self.settle_idle();
    }

    async fn on_completion(&mut self, render: RenderId, outcome: CompletionOutcome) {
        if self.state.is_idle() || self.active_render != Some(render) {
            debug!(
                guild = %self.guild,
                render = %render,
                active = ?self.active_render,
                %outcome,
                "Stale completion dropped"
            );
            return;
        }

        self.active_render = None;
        let finished = self.current.take();

        match outcome {
            CompletionOutcome::Finished => {
                debug!(guild = %self.guild, render = %render, "Render finished");
                self.advance(finished).await;
            }
            CompletionOutcome::Failed(reason) => {
                warn!(guild = %self.guild, render = %render, %reason, "Render failed");
                let message = match &finished {
                    Some(track) => format!("Playback of {} failed: {}", track, reason),
                    None => format!("Playback failed: {}", reason),
                };
                self.notify("error", self.notifier.error(self.guild, &message));
                self.advance(None).await;
            }
        }
    }

    /// Move to the next playable track
    ///
    /// `finished` is the track that just ended normally; with loop on it is
    /// re-queued at the tail before the head is taken. Tracks that fail to
    /// start are dropped, so the loop ends after at most one attempt per
    /// queued track.
    async fn advance(&mut self, finished: Option<Track>) {
        if let Some(track) = finished {
            if self.loop_enabled {
                self.queue.push_back(track);
            }
        }

        let mut failures = 0usize;

        while let Some(track) = self.queue.pop_front() {
            self.current = Some(track.clone());
            self.state = SessionState::Transitioning;

            match self.start_render(&track).await {
                StartOutcome::Started => {
                    self.state = SessionState::Playing;
                    info!(guild = %self.guild, track = %track, "Now playing");
                    self.notify(
                        "now_playing",
                        self.notifier
                            .now_playing(self.guild, &track, self.volume, self.loop_enabled),
                    );
                    return;
                }
                StartOutcome::Failed(DriverError::VoiceJoin(reason)) => {
                    warn!(guild = %self.guild, %reason, "Voice join failed, playback halted");
                    self.settle_idle();
                    self.queue.push_front(track);
                    let message = Error::VoiceJoinFailure(reason).user_message();
                    self.notify("error", self.notifier.error(self.guild, &message));
                    return;
                }
                StartOutcome::Failed(err) => {
                    failures += 1;
                    warn!(guild = %self.guild, track = %track, error = %err, "Track failed to start, skipping");
                    self.active_render = None;
                    let message = format!("Could not play {}: {}", track, err);
                    self.notify("error", self.notifier.error(self.guild, &message));
                }
                StartOutcome::Cancelled => {
                    debug!(guild = %self.guild, track = %track, "Start abandoned by disconnect");
                    self.settle_idle();
                    return;
                }
            }
        }

        self.settle_idle();

        if failures > 0 {
            let message = format!(
                "Could not start any of the {} queued track(s), playback stopped",
                failures
            );
            self.notify("error", self.notifier.error(self.guild, &message));
        }
    }

    /// Ask the driver to start one track, bounded by the start timeout
    ///
    /// Does not read the message queue while waiting; only a disconnect
    /// (through the epoch watch) can interrupt.
    async fn start_render(&mut self, track: &Track) -> StartOutcome {
        self.next_render += 1;
        let render = RenderId(self.next_render);
        self.active_render = Some(render);

        let Some(tx) = self.self_tx.upgrade() else {
            self.active_render = None;
            return StartOutcome::Cancelled;
        };
        let completion = CompletionHandle::new(render, tx);

        // Only disconnects requested from now on interrupt this start
        self.disconnect_rx.borrow_and_update();

        let driver = Arc::clone(&self.driver);
        let timeout = self.config.start_timeout;
        let start = tokio::time::timeout(timeout, driver.start(track, self.volume, completion));

        debug!(guild = %self.guild, render = %render, track = %track, "Starting render");

        let outcome = tokio::select! {
            result = start => match result {
                Ok(Ok(())) => StartOutcome::Started,
                Ok(Err(e)) => StartOutcome::Failed(e),
                Err(_) => {
                    self.stop_abandoned(render).await;
                    StartOutcome::Failed(DriverError::Start(format!(
                        "no start acknowledgement within {}s",
                        timeout.as_secs_f32()
                    )))
                }
            },
            Ok(()) = self.disconnect_rx.changed() => {
                self.stop_abandoned(render).await;
                StartOutcome::Cancelled
            }
        };

        if !matches!(outcome, StartOutcome::Started) {
            self.active_render = None;
        }
        outcome
    }

    async fn stop_abandoned(&self, render: RenderId) {
        if let Err(e) = self.driver.stop().await {
            warn!(guild = %self.guild, render = %render, error = %e, "Driver stop failed for abandoned start");
        }
    }

    fn settle_idle(&mut self) {
        self.current = None;
        self.active_render = None;
        self.state = SessionState::Idle;
    }

    fn notify(&self, kind: &str, result: anyhow::Result<()>) {
        if let Err(e) = result {
            error!(guild = %self.guild, notification = kind, error = %e, "Notifier failed");
        }
    }
}

//! Playback driver boundary
//!
//! A driver renders one track at a time for one guild. The session starts a
//! render with a [`CompletionHandle`]; the driver reports the end of that
//! render (natural finish, stop request, or error) through the handle, and
//! the report travels through the session's own message queue.

mod timed;

pub use timed::TimedDriver;

use async_trait::async_trait;
use hertz_common::events::CompletionOutcome;
use hertz_common::{GuildId, Track};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::session::SessionMessage;

/// Identifies one driver start of one track within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(pub u64);

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render-{}", self.0)
    }
}

/// Driver failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Could not attach to a voice channel; needs user action
    #[error("voice join failed: {0}")]
    VoiceJoin(String),

    /// This track could not be started
    #[error("start failed: {0}")]
    Start(String),

    /// Stop or volume request rejected
    #[error("control request failed: {0}")]
    Control(String),
}

impl From<DriverError> for crate::Error {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::VoiceJoin(reason) => crate::Error::VoiceJoinFailure(reason),
            DriverError::Start(reason) => crate::Error::PlaybackStartFailure(reason),
            DriverError::Control(reason) => crate::Error::Internal(reason),
        }
    }
}

/// Reports the end of one render back to its session
///
/// Safe to call from any thread or task. Signals for a render the session no
/// longer considers active are discarded by the session.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    render: RenderId,
    tx: mpsc::UnboundedSender<SessionMessage>,
}

impl CompletionHandle {
    pub(crate) fn new(render: RenderId, tx: mpsc::UnboundedSender<SessionMessage>) -> Self {
        Self { render, tx }
    }

    pub fn render_id(&self) -> RenderId {
        self.render
    }

    /// The render ended normally or was stopped on request
    pub fn finished(&self) {
        self.send(CompletionOutcome::Finished);
    }

    /// The render aborted with an error
    pub fn failed(&self, reason: impl Into<String>) {
        self.send(CompletionOutcome::Failed(reason.into()));
    }

    fn send(&self, outcome: CompletionOutcome) {
        let message = SessionMessage::Completion {
            render: self.render,
            outcome,
        };
        if self.tx.send(message).is_err() {
            debug!(render = %self.render, "Completion dropped, session has stopped");
        }
    }
}

/// Audio rendering for one guild
///
/// Contract:
/// - `start` resolves once rendering has begun (ack) or failed. The handle
///   must eventually receive exactly one signal for every acknowledged start.
/// - `stop` requests early termination; the render then signals through the
///   same completion path as a natural finish.
/// - `set_volume` applies to the in-flight render without restarting it.
#[async_trait]
pub trait PlaybackDriver: Send + Sync {
    async fn start(
        &self,
        track: &Track,
        volume: f32,
        completion: CompletionHandle,
    ) -> Result<(), DriverError>;

    async fn stop(&self) -> Result<(), DriverError>;

    async fn set_volume(&self, volume: f32) -> Result<(), DriverError>;
}

/// Creates the driver a new session will use
pub trait DriverFactory: Send + Sync {
    fn create(&self, guild: GuildId) -> Arc<dyn PlaybackDriver>;
}

impl<F> DriverFactory for F
where
    F: Fn(GuildId) -> Arc<dyn PlaybackDriver> + Send + Sync,
{
    fn create(&self, guild: GuildId) -> Arc<dyn PlaybackDriver> {
        self(guild)
    }
}

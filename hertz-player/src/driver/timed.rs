//! Wall-clock playback driver
//!
//! Renders nothing: each start simply holds the track for its reported
//! duration and then signals completion. Used by the standalone service
//! where no voice gateway is attached, and handy for manual testing of the
//! session lifecycle through the HTTP surface.

use async_trait::async_trait;
use hertz_common::time::secs_to_duration;
use hertz_common::Track;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use super::{CompletionHandle, DriverError, PlaybackDriver};

/// Driver that "plays" a track by sleeping for its duration
pub struct TimedDriver {
    unknown_duration: Duration,
    inner: Mutex<TimedDriverState>,
}

#[derive(Default)]
struct TimedDriverState {
    volume: f32,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl TimedDriver {
    /// `unknown_duration` is used for tracks that report a length of 0
    pub fn new(unknown_duration: Duration) -> Self {
        Self {
            unknown_duration,
            inner: Mutex::new(TimedDriverState::default()),
        }
    }

    /// Volume most recently applied to the render
    pub fn volume(&self) -> f32 {
        self.inner.lock().map(|state| state.volume).unwrap_or_default()
    }

    fn render_length(&self, track: &Track) -> Duration {
        match track.duration_secs() {
            0 => self.unknown_duration,
            secs => secs_to_duration(secs),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TimedDriverState>, DriverError> {
        self.inner
            .lock()
            .map_err(|_| DriverError::Control("driver state poisoned".to_string()))
    }
}

#[async_trait]
impl PlaybackDriver for TimedDriver {
    async fn start(
        &self,
        track: &Track,
        volume: f32,
        completion: CompletionHandle,
    ) -> Result<(), DriverError> {
        if track.stream_url().is_empty() {
            return Err(DriverError::Start(format!("'{}' has no stream URL", track.title())));
        }

        let length = self.render_length(track);
        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut state = self.lock()?;
            state.volume = volume;
            // A previous render still holding the slot is stopped by dropping its sender
            state.stop_tx = Some(stop_tx);
        }

        debug!(render = %completion.render_id(), track = %track, ?length, "Timed render started");

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(length) => {
                    trace!(render = %completion.render_id(), "Timed render reached end of track");
                }
                _ = stop_rx => {
                    trace!(render = %completion.render_id(), "Timed render stopped");
                }
            }
            completion.finished();
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), DriverError> {
        let stop_tx = self.lock()?.stop_tx.take();
        if let Some(tx) = stop_tx {
            let _ = tx.send(());
        }
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<(), DriverError> {
        self.lock()?.volume = volume;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RenderId;
    use crate::session::SessionMessage;
    use hertz_common::events::CompletionOutcome;
    use hertz_common::{Requester, ResolvedTrack, TrackOrigin};
    use tokio::sync::mpsc;

    fn track(duration_secs: u64, stream_url: &str) -> Track {
        ResolvedTrack {
            id: "t1".to_string(),
            title: "Test Tone".to_string(),
            source_page_url: "https://example.com/t1".to_string(),
            stream_url: stream_url.to_string(),
            duration_secs,
            thumbnail_url: None,
            artist: None,
            album: None,
            origin: TrackOrigin::DirectStream,
        }
        .requested_by(Requester::new("tester"))
    }

    #[tokio::test]
    async fn test_stop_signals_completion() {
        let driver = TimedDriver::new(Duration::from_secs(600));
        let (tx, mut rx) = mpsc::unbounded_channel();

        driver
            .start(&track(600, "https://cdn.example.com/a"), 0.5, CompletionHandle::new(RenderId(1), tx))
            .await
            .unwrap();
        driver.stop().await.unwrap();

        match rx.recv().await {
            Some(SessionMessage::Completion { render, outcome }) => {
                assert_eq!(render, RenderId(1));
                assert_eq!(outcome, CompletionOutcome::Finished);
            }
            other => panic!("Expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_duration_fallback() {
        let driver = TimedDriver::new(Duration::from_millis(10));
        let (tx, mut rx) = mpsc::unbounded_channel();

        driver
            .start(&track(0, "https://cdn.example.com/a"), 0.5, CompletionHandle::new(RenderId(2), tx))
            .await
            .unwrap();

        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("completion within fallback length");
        assert!(matches!(message, Some(SessionMessage::Completion { .. })));
    }

    #[tokio::test]
    async fn test_missing_stream_url_fails_start() {
        let driver = TimedDriver::new(Duration::from_secs(1));
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = driver
            .start(&track(10, ""), 0.5, CompletionHandle::new(RenderId(3), tx))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Start(_)));
    }

    #[tokio::test]
    async fn test_volume_is_applied() {
        let driver = TimedDriver::new(Duration::from_secs(1));
        driver.set_volume(0.3).await.unwrap();
        assert_eq!(driver.volume(), 0.3);
    }
}

//! Test helper modules for Hertz Player integration tests
//!
//! Provides reusable test infrastructure components:
//! - ScriptedDriver: playback driver with scripted start outcomes
//! - RecordingNotifier: captures session notifications in order
//! - StubResolver: resolves any query except "nothing"
//! - Track builders and polling helpers

#![allow(dead_code)]

use async_trait::async_trait;
use hertz_common::{GuildId, Requester, ResolvedTrack, Track, TrackOrigin};
use hertz_player::driver::{CompletionHandle, DriverError, PlaybackDriver};
use hertz_player::notifier::Notifier;
use hertz_player::resolver::TrackResolver;
use hertz_player::session::{PlaybackSession, SessionConfig};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Tracks
// ============================================================================

pub fn resolved(id: &str) -> ResolvedTrack {
    ResolvedTrack {
        id: id.to_string(),
        title: format!("Track {}", id.to_uppercase()),
        source_page_url: format!("https://example.com/watch/{}", id),
        stream_url: format!("https://cdn.example.com/{}.opus", id),
        duration_secs: 180,
        thumbnail_url: None,
        artist: None,
        album: None,
        origin: TrackOrigin::DirectStream,
    }
}

pub fn track(id: &str) -> Track {
    resolved(id).requested_by(Requester::new("tester"))
}

// ============================================================================
// ScriptedDriver
// ============================================================================

#[derive(Default)]
struct Script {
    starts: Vec<String>,
    stops: usize,
    volumes: Vec<f32>,
    active: Option<CompletionHandle>,
    fail_start: HashMap<String, DriverError>,
    hang_start: HashSet<String>,
    ignore_stop: bool,
}

/// Driver whose start outcome is scripted per track id
///
/// Successful starts keep the completion handle; the test decides when the
/// render ends. `stop` finishes the active render unless told otherwise.
#[derive(Default)]
pub struct ScriptedDriver {
    script: Mutex<Script>,
}

impl ScriptedDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every start of `track_id` with `error`
    pub fn fail_start(&self, track_id: &str, error: DriverError) {
        self.lock().fail_start.insert(track_id.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.lock().fail_start.clear();
    }

    /// Never acknowledge a start of `track_id`
    pub fn hang_start(&self, track_id: &str) {
        self.lock().hang_start.insert(track_id.to_string());
    }

    /// Make `stop` a no-op, as if the stop raced a render that already ended
    pub fn ignore_stop(&self) {
        self.lock().ignore_stop = true;
    }

    /// Track ids in start order, including failed attempts
    pub fn starts(&self) -> Vec<String> {
        self.lock().starts.clone()
    }

    pub fn stops(&self) -> usize {
        self.lock().stops
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.lock().volumes.clone()
    }

    /// Handle of the most recent acknowledged render
    pub fn active_handle(&self) -> Option<CompletionHandle> {
        self.lock().active.clone()
    }

    /// End the active render normally
    pub fn finish_current(&self) {
        if let Some(handle) = self.lock().active.take() {
            handle.finished();
        }
    }

    /// Abort the active render with an error
    pub fn fail_current(&self, reason: &str) {
        if let Some(handle) = self.lock().active.take() {
            handle.failed(reason);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl PlaybackDriver for ScriptedDriver {
    async fn start(
        &self,
        track: &Track,
        volume: f32,
        completion: CompletionHandle,
    ) -> Result<(), DriverError> {
        let hang = {
            let mut script = self.lock();
            script.starts.push(track.id().to_string());
            script.volumes.push(volume);
            if let Some(error) = script.fail_start.get(track.id()) {
                return Err(error.clone());
            }
            script.hang_start.contains(track.id())
        };

        if hang {
            std::future::pending::<()>().await;
        }

        self.lock().active = Some(completion);
        Ok(())
    }

    async fn stop(&self) -> Result<(), DriverError> {
        let active = {
            let mut script = self.lock();
            script.stops += 1;
            if script.ignore_stop {
                None
            } else {
                script.active.take()
            }
        };
        if let Some(handle) = active {
            handle.finished();
        }
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<(), DriverError> {
        self.lock().volumes.push(volume);
        Ok(())
    }
}

// ============================================================================
// RecordingNotifier
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Added { track_id: String, position: usize },
    NowPlaying { track_id: String, volume: f32, loop_enabled: bool },
    Error(String),
    Removed { track_id: String },
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record every notice but report each delivery as failed
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn now_playing_ids(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::NowPlaying { track_id, .. } => Some(track_id),
                _ => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) -> anyhow::Result<()> {
        self.notices.lock().unwrap().push(notice);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("notification channel unavailable");
        }
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    fn added(&self, _guild: GuildId, track: &Track, position: usize) -> anyhow::Result<()> {
        self.push(Notice::Added {
            track_id: track.id().to_string(),
            position,
        })
    }

    fn now_playing(
        &self,
        _guild: GuildId,
        track: &Track,
        volume: f32,
        loop_enabled: bool,
    ) -> anyhow::Result<()> {
        self.push(Notice::NowPlaying {
            track_id: track.id().to_string(),
            volume,
            loop_enabled,
        })
    }

    fn error(&self, _guild: GuildId, message: &str) -> anyhow::Result<()> {
        self.push(Notice::Error(message.to_string()))
    }

    fn removed(&self, _guild: GuildId, track: &Track) -> anyhow::Result<()> {
        self.push(Notice::Removed {
            track_id: track.id().to_string(),
        })
    }
}

// ============================================================================
// StubResolver
// ============================================================================

/// Resolves every query to a track whose id is the query text
pub struct StubResolver;

#[async_trait]
impl TrackResolver for StubResolver {
    async fn resolve(&self, query: &str) -> hertz_player::Result<ResolvedTrack> {
        if query == "nothing" {
            return Err(hertz_player::Error::ResolutionFailure(query.to_string()));
        }
        Ok(resolved(query))
    }
}

// ============================================================================
// Session harness
// ============================================================================

pub struct TestSession {
    pub session: PlaybackSession,
    pub driver: Arc<ScriptedDriver>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_session() -> TestSession {
    test_session_with(SessionConfig::default())
}

pub fn test_session_with(config: SessionConfig) -> TestSession {
    let driver = ScriptedDriver::new();
    let notifier = RecordingNotifier::new();
    let session = PlaybackSession::spawn(GuildId(42), driver.clone(), notifier.clone(), config);
    TestSession {
        session,
        driver,
        notifier,
    }
}

/// Poll `condition` every few milliseconds until it holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 2s");
}

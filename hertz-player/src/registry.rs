//! Guild -> session registry
//!
//! Sessions are created on first access and live for the rest of the
//! process. The map lock is only held for lookup and insert; session
//! operations run after it is released.

use hertz_common::GuildId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::driver::DriverFactory;
use crate::notifier::Notifier;
use crate::session::{PlaybackSession, SessionConfig};

pub struct SessionRegistry {
    sessions: RwLock<HashMap<GuildId, PlaybackSession>>,
    drivers: Arc<dyn DriverFactory>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(
        drivers: Arc<dyn DriverFactory>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            drivers,
            notifier,
            config,
        }
    }

    /// Session for `guild`, spawning it on first use
    ///
    /// Concurrent callers for the same guild always receive handles to the
    /// same session.
    pub async fn get_or_create(&self, guild: GuildId) -> PlaybackSession {
        if let Some(session) = self.sessions.read().await.get(&guild) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(guild)
            .or_insert_with(|| {
                info!(guild = %guild, "Creating playback session");
                PlaybackSession::spawn(
                    guild,
                    self.drivers.create(guild),
                    Arc::clone(&self.notifier),
                    self.config,
                )
            })
            .clone()
    }

    /// Existing session for `guild`, without creating one
    pub async fn get(&self, guild: GuildId) -> Option<PlaybackSession> {
        self.sessions.read().await.get(&guild).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn guilds(&self) -> Vec<GuildId> {
        let mut guilds: Vec<GuildId> = self.sessions.read().await.keys().copied().collect();
        guilds.sort();
        guilds
    }

    /// Stop every session actor
    ///
    /// Used at process exit. Sessions are removed from the registry first so
    /// no new command reaches a stopping actor.
    pub async fn shutdown(&self) {
        let sessions: Vec<PlaybackSession> = {
            let mut map = self.sessions.write().await;
            map.drain().map(|(_, session)| session).collect()
        };

        info!(count = sessions.len(), "Shutting down playback sessions");

        for session in &sessions {
            session.shutdown().await;
        }
    }
}

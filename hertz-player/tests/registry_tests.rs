//! Session registry tests: creation races, guild isolation, shutdown

mod helpers;

use futures::future::join_all;
use hertz_common::GuildId;
use hertz_player::driver::{DriverFactory, PlaybackDriver};
use hertz_player::session::SessionConfig;
use hertz_player::{Error, SessionRegistry};
use helpers::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn registry_with(drivers: Arc<dyn DriverFactory>) -> Arc<SessionRegistry> {
    Arc::new(SessionRegistry::new(
        drivers,
        RecordingNotifier::new(),
        SessionConfig::default(),
    ))
}

#[tokio::test]
async fn test_concurrent_get_or_create_yields_one_session() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let registry = registry_with(Arc::new(move |_guild: GuildId| {
        counter.fetch_add(1, Ordering::SeqCst);
        ScriptedDriver::new() as Arc<dyn PlaybackDriver>
    }));

    let handles = join_all((0..16).map(|_| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.get_or_create(GuildId(7)).await })
    }))
    .await;

    let sessions: Vec<_> = handles.into_iter().map(|h| h.unwrap()).collect();
    assert!(sessions.iter().all(|s| s.same_session(&sessions[0])));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_get_does_not_create() {
    let registry = registry_with(Arc::new(|_guild: GuildId| {
        ScriptedDriver::new() as Arc<dyn PlaybackDriver>
    }));

    assert!(registry.get(GuildId(1)).await.is_none());
    assert!(registry.is_empty().await);

    let created = registry.get_or_create(GuildId(1)).await;
    let found = registry.get(GuildId(1)).await.unwrap();
    assert!(found.same_session(&created));
    assert_eq!(found.guild_id(), GuildId(1));
}

#[tokio::test]
async fn test_guilds_are_independent() {
    let stuck = ScriptedDriver::new();
    let healthy = ScriptedDriver::new();
    stuck.hang_start("a");

    let (stuck_for_factory, healthy_for_factory) = (stuck.clone(), healthy.clone());
    let registry = registry_with(Arc::new(move |guild: GuildId| {
        if guild == GuildId(1) {
            stuck_for_factory.clone() as Arc<dyn PlaybackDriver>
        } else {
            healthy_for_factory.clone() as Arc<dyn PlaybackDriver>
        }
    }));

    let guild_one = registry.get_or_create(GuildId(1)).await;
    tokio::spawn(async move { guild_one.enqueue(track("a")).await });
    wait_until(move || stuck.starts().len() == 1).await;

    let guild_two = registry.get_or_create(GuildId(2)).await;
    tokio::time::timeout(Duration::from_secs(1), guild_two.enqueue(track("b")))
        .await
        .expect("guild 2 is not blocked by guild 1")
        .unwrap();

    let snap = guild_two.snapshot().await.unwrap();
    assert_eq!(snap.current.as_ref().map(|t| t.id()), Some("b"));
    assert_eq!(healthy.starts(), vec!["b"]);
    assert_eq!(registry.guilds().await, vec![GuildId(1), GuildId(2)]);
}

#[tokio::test]
async fn test_shutdown_closes_sessions() {
    let driver = ScriptedDriver::new();
    let for_factory = driver.clone();
    let registry = registry_with(Arc::new(move |_guild: GuildId| {
        for_factory.clone() as Arc<dyn PlaybackDriver>
    }));

    let session = registry.get_or_create(GuildId(3)).await;
    session.enqueue(track("a")).await.unwrap();

    registry.shutdown().await;

    assert!(registry.is_empty().await);
    assert_eq!(driver.stops(), 1);
    assert!(matches!(session.enqueue(track("b")).await, Err(Error::SessionClosed)));
    assert!(session.is_closed());
}

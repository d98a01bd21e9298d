//! Read-only session views
//!
//! Snapshots are produced by the session actor, so each one is consistent
//! with a single point in the session's message order.

use hertz_common::events::SessionState;
use hertz_common::human_time::{format_total_duration, format_volume_percent};
use hertz_common::{GuildId, Track};
use serde::Serialize;

use super::queue::QUEUE_PAGE_SIZE;
use crate::{Error, Result};

/// Point-in-time copy of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub guild_id: GuildId,
    pub state: SessionState,
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    /// 0.0-1.0
    pub volume: f32,
    pub loop_enabled: bool,
}

/// One page of the queue listing
#[derive(Debug, Clone, Serialize)]
pub struct QueuePage {
    /// 1-based page number
    pub page: usize,
    /// `ceil(track_count / 10)`, 0 for an empty queue
    pub total_pages: usize,
    pub now_playing: Option<Track>,
    pub entries: Vec<QueueEntry>,
    pub track_count: usize,
    pub total_duration_secs: u64,
    /// e.g. "1h 2m 5s"
    pub total_duration: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    /// 1-based queue position, usable with remove
    pub position: usize,
    pub track: Track,
}

/// Current track with the session settings shown alongside it
#[derive(Debug, Clone, Serialize)]
pub struct NowPlaying {
    pub track: Track,
    pub volume: f32,
    /// e.g. "50%"
    pub volume_percent: String,
    pub loop_enabled: bool,
}

impl SessionSnapshot {
    pub fn queue_page(&self, page: usize) -> Result<QueuePage> {
        let track_count = self.queue.len();
        let total_pages = track_count.div_ceil(QUEUE_PAGE_SIZE);

        // An empty queue still has a (blank) first page
        let last_page = total_pages.max(1);
        if page == 0 || page > last_page {
            return Err(Error::InvalidArgument(format!(
                "Invalid page number, the queue has {} page(s)",
                last_page
            )));
        }

        let start = (page - 1).saturating_mul(QUEUE_PAGE_SIZE);
        let entries = self
            .queue
            .iter()
            .enumerate()
            .skip(start)
            .take(QUEUE_PAGE_SIZE)
            .map(|(index, track)| QueueEntry {
                position: index + 1,
                track: track.clone(),
            })
            .collect();

        let total_duration_secs = self.queue.iter().map(Track::duration_secs).sum();

        Ok(QueuePage {
            page,
            total_pages,
            now_playing: self.current.clone(),
            entries,
            track_count,
            total_duration_secs,
            total_duration: format_total_duration(total_duration_secs),
        })
    }

    pub fn now_playing(&self) -> Result<NowPlaying> {
        let track = self.current.clone().ok_or(Error::NothingPlaying)?;
        Ok(NowPlaying {
            track,
            volume: self.volume,
            volume_percent: format_volume_percent(self.volume),
            loop_enabled: self.loop_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hertz_common::{Requester, ResolvedTrack, TrackOrigin};

    fn track(n: usize) -> Track {
        ResolvedTrack {
            id: n.to_string(),
            title: format!("Track {}", n),
            source_page_url: String::new(),
            stream_url: format!("https://cdn.example.com/{}", n),
            duration_secs: 60,
            thumbnail_url: None,
            artist: None,
            album: None,
            origin: TrackOrigin::DirectStream,
        }
        .requested_by(Requester::new("tester"))
    }

    fn snapshot(queued: usize, playing: bool) -> SessionSnapshot {
        SessionSnapshot {
            guild_id: GuildId(1),
            state: if playing { SessionState::Playing } else { SessionState::Idle },
            current: playing.then(|| track(0)),
            queue: (1..=queued).map(track).collect(),
            volume: 0.5,
            loop_enabled: false,
        }
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page = snapshot(21, true).queue_page(3).unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].position, 21);
        assert_eq!(page.track_count, 21);
        assert_eq!(page.total_duration_secs, 21 * 60);
        assert_eq!(page.total_duration, "21m 0s");
    }

    #[test]
    fn test_second_page_positions() {
        let page = snapshot(15, true).queue_page(2).unwrap();
        let positions: Vec<usize> = page.entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, (11..=15).collect::<Vec<_>>());
        assert_eq!(page.now_playing.unwrap().id(), "0");
    }

    #[test]
    fn test_out_of_range_pages_rejected() {
        let snap = snapshot(10, true);
        assert!(matches!(snap.queue_page(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(snap.queue_page(2), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_queue_first_page() {
        let page = snapshot(0, false).queue_page(1).unwrap();
        assert_eq!(page.total_pages, 0);
        assert!(page.entries.is_empty());
        assert!(page.now_playing.is_none());
    }

    #[test]
    fn test_empty_queue_has_only_first_page() {
        let snap = snapshot(0, true);
        assert!(matches!(snap.queue_page(2), Err(Error::InvalidArgument(_))));
        assert!(matches!(snap.queue_page(7), Err(Error::InvalidArgument(_))));
        assert!(matches!(snap.queue_page(usize::MAX), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_huge_page_number_rejected() {
        let snap = snapshot(25, true);
        assert!(matches!(snap.queue_page(usize::MAX), Err(Error::InvalidArgument(_))));
        assert_eq!(snap.queue_page(3).unwrap().entries.len(), 5);
    }

    #[test]
    fn test_now_playing_requires_current() {
        assert!(matches!(snapshot(3, false).now_playing(), Err(Error::NothingPlaying)));

        let now = snapshot(0, true).now_playing().unwrap();
        assert_eq!(now.volume_percent, "50%");
        assert!(!now.loop_enabled);
    }
}

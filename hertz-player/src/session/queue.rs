//! Per-session FIFO track queue
//!
//! Positions exposed to users are 1-based. The current track is never in the
//! queue; it lives in the session.

use hertz_common::Track;
use std::collections::VecDeque;

use crate::{Error, Result};

/// Entries shown per queue page
pub const QUEUE_PAGE_SIZE: usize = 10;

/// Upcoming tracks in play order
#[derive(Debug, Default, Clone)]
pub struct TrackQueue {
    tracks: VecDeque<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail, returning the 1-based position of the new entry
    pub fn push_back(&mut self, track: Track) -> usize {
        self.tracks.push_back(track);
        self.tracks.len()
    }

    /// Put a track back at the head
    pub fn push_front(&mut self, track: Track) {
        self.tracks.push_front(track);
    }

    pub fn pop_front(&mut self) -> Option<Track> {
        self.tracks.pop_front()
    }

    /// Remove by 1-based position
    ///
    /// Out-of-range positions leave the queue untouched.
    pub fn remove(&mut self, position: usize) -> Result<Track> {
        if position == 0 || position > self.tracks.len() {
            return Err(Error::InvalidArgument("Invalid queue position".to_string()));
        }
        self.tracks
            .remove(position - 1)
            .ok_or_else(|| Error::InvalidArgument("Invalid queue position".to_string()))
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Sum of known track durations in seconds
    pub fn total_duration_secs(&self) -> u64 {
        self.tracks.iter().map(Track::duration_secs).sum()
    }

    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }
}

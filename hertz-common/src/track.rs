//! Track model
//!
//! A resolver produces a [`ResolvedTrack`]; the command layer attaches the
//! requester exactly once with [`ResolvedTrack::requested_by`], producing the
//! immutable [`Track`] that sessions queue and play.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::human_time::format_track_duration;
use crate::Error;

/// Chat server (tenant) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        GuildId(id)
    }
}

impl FromStr for GuildId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(GuildId)
            .map_err(|e| Error::InvalidInput(format!("Invalid guild id '{}': {}", s, e)))
    }
}

/// Where a track came from (affects display only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackOrigin {
    /// Directly streamable page or URL (video sites, radio streams)
    DirectStream,
    /// Streaming service link (Spotify and similar)
    StreamingService,
}

impl fmt::Display for TrackOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackOrigin::DirectStream => write!(f, "direct_stream"),
            TrackOrigin::StreamingService => write!(f, "streaming_service"),
        }
    }
}

/// Who asked for a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl Requester {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

/// Resolver output: everything about a track except who requested it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    /// Opaque resolver-assigned identifier
    pub id: String,
    pub title: String,
    /// Human-facing page for the track
    pub source_page_url: String,
    /// URL the playback driver renders from
    pub stream_url: String,
    /// Length in seconds, 0 when unknown
    pub duration_secs: u64,
    pub thumbnail_url: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub origin: TrackOrigin,
}

impl ResolvedTrack {
    /// Attach the requester, producing the immutable queueable track
    pub fn requested_by(self, requester: Requester) -> Track {
        Track {
            resolved: self,
            requested_by: requester,
        }
    }
}

/// Immutable, queueable track
///
/// There are no setters and no `Deserialize`: a `Track` only comes into
/// existence through [`ResolvedTrack::requested_by`], so the requester is
/// set exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    #[serde(flatten)]
    resolved: ResolvedTrack,
    requested_by: Requester,
}

impl Track {
    pub fn id(&self) -> &str {
        &self.resolved.id
    }

    pub fn title(&self) -> &str {
        &self.resolved.title
    }

    pub fn source_page_url(&self) -> &str {
        &self.resolved.source_page_url
    }

    pub fn stream_url(&self) -> &str {
        &self.resolved.stream_url
    }

    pub fn duration_secs(&self) -> u64 {
        self.resolved.duration_secs
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.resolved.thumbnail_url.as_deref()
    }

    pub fn artist(&self) -> Option<&str> {
        self.resolved.artist.as_deref()
    }

    pub fn album(&self) -> Option<&str> {
        self.resolved.album.as_deref()
    }

    pub fn origin(&self) -> TrackOrigin {
        self.resolved.origin
    }

    pub fn requested_by(&self) -> &Requester {
        &self.requested_by
    }

    /// Duration as `m:ss`, or `N/A` when unknown
    pub fn display_duration(&self) -> String {
        format_track_duration(self.resolved.duration_secs)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.artist() {
            Some(artist) if !artist.is_empty() => write!(f, "{} - {}", artist, self.title()),
            _ => write!(f, "{}", self.title()),
        }
    }
}

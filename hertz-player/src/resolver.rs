//! Track resolution
//!
//! Turns a user query (URL or free text) into a [`ResolvedTrack`]. The
//! production adapter shells out to `yt-dlp` and maps its JSON.

use async_trait::async_trait;
use hertz_common::{ResolvedTrack, TrackOrigin};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::{Error, Result};

/// Hosts whose links are streaming-service pages rather than media pages
const STREAMING_SERVICE_HOSTS: &[&str] = &[
    "open.spotify.com",
    "spotify.link",
    "music.apple.com",
    "deezer.com",
    "www.deezer.com",
    "tidal.com",
    "listen.tidal.com",
];

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Query -> playable track
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// `ResolutionFailure` when nothing matches
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack>;
}

/// Resolver backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: RESOLVE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidArgument("Query must not be empty".to_string()));
        }

        let target = yt_dlp_target(query);
        debug!(program = %self.program.display(), %target, "Resolving track");

        let mut command = Command::new(&self.program);
        command
            .arg("--dump-single-json")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--format")
            .arg("bestaudio/best")
            .arg(&target)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| Error::ResolutionFailure(format!("{} (timed out)", query)))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(%target, status = %output.status, stderr = %stderr.trim(), "yt-dlp failed");
            return Err(Error::ResolutionFailure(query.to_string()));
        }

        parse_yt_dlp_output(query, &output.stdout)
    }
}

/// Argument handed to yt-dlp for a user query
pub fn yt_dlp_target(query: &str) -> String {
    if is_url(query) {
        query.to_string()
    } else {
        format!("ytsearch1:{}", query)
    }
}

/// `Some` for absolute http(s) links; anything else is search text
fn parse_link(query: &str) -> Option<Url> {
    Url::parse(query)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

fn is_url(query: &str) -> bool {
    parse_link(query).is_some()
}

/// Origin of a query, by host
pub fn classify_origin(query: &str) -> TrackOrigin {
    let host = parse_link(query)
        .and_then(|url| url.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase()));

    match host {
        Some(host) if STREAMING_SERVICE_HOSTS.contains(&host.as_str()) => {
            TrackOrigin::StreamingService
        }
        _ => TrackOrigin::DirectStream,
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    original_url: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    uploader: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    #[serde(default)]
    entries: Option<Vec<YtDlpInfo>>,
}

/// Map `yt-dlp --dump-single-json` output to a track
///
/// Search results arrive as a playlist; its first entry is used.
pub fn parse_yt_dlp_output(query: &str, stdout: &[u8]) -> Result<ResolvedTrack> {
    let mut info: YtDlpInfo = serde_json::from_slice(stdout).map_err(|e| {
        warn!(error = %e, "Unreadable yt-dlp output");
        Error::ResolutionFailure(query.to_string())
    })?;

    let info = match info.entries.take() {
        Some(entries) => entries
            .into_iter()
            .next()
            .ok_or_else(|| Error::ResolutionFailure(query.to_string()))?,
        None => info,
    };

    let stream_url = info
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::ResolutionFailure(query.to_string()))?;

    let source_page_url = info
        .webpage_url
        .or(info.original_url)
        .unwrap_or_else(|| query.to_string());

    let duration_secs = info
        .duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.round() as u64)
        .unwrap_or(0);

    Ok(ResolvedTrack {
        id: info.id.unwrap_or_else(|| source_page_url.clone()),
        title: info.title.unwrap_or_else(|| "Unknown title".to_string()),
        origin: classify_origin(query),
        source_page_url,
        stream_url,
        duration_secs,
        thumbnail_url: info.thumbnail,
        artist: info.artist.or(info.uploader),
        album: info.album,
    })
}

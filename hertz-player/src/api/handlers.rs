//! HTTP request handlers
//!
//! Each handler maps one request onto a [`MusicCommands`] call.
//!
//! [`MusicCommands`]: crate::commands::MusicCommands

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hertz_common::{GuildId, Requester, Track};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState};
use crate::commands::EnqueueReceipt;
use crate::session::{NowPlaying, QueuePage};
use crate::Error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    /// URL or search text
    pub query: String,
    pub requester: String,
    pub requester_avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueueParams {
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0-100, out-of-range values are clamped
    pub percent: i64,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    pub percent: u8,
}

#[derive(Debug, Deserialize)]
pub struct LoopRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct LoopResponse {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub track: Track,
}

// ============================================================================
// Handlers
// ============================================================================

fn parse_guild(raw: &str) -> Result<GuildId, ApiError> {
    raw.parse::<GuildId>()
        .map_err(|e| ApiError(Error::from(e)))
}

/// POST /guilds/:guild_id/play
pub async fn play(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Json(req): Json<PlayRequest>,
) -> Result<(StatusCode, Json<EnqueueReceipt>), ApiError> {
    let guild = parse_guild(&guild_id)?;
    let mut requester = Requester::new(req.requester);
    if let Some(avatar) = req.requester_avatar_url {
        requester = requester.with_avatar(avatar);
    }

    let receipt = state.commands.play(guild, &req.query, requester).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// POST /guilds/:guild_id/skip
pub async fn skip(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<Json<TrackResponse>, ApiError> {
    let track = state.commands.skip(parse_guild(&guild_id)?).await?;
    Ok(Json(TrackResponse { track }))
}

/// GET /guilds/:guild_id/queue?page=N
pub async fn get_queue(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Query(params): Query<QueueParams>,
) -> Result<Json<QueuePage>, ApiError> {
    let page = params.page.unwrap_or(1);
    let queue = state.commands.queue(parse_guild(&guild_id)?, page).await?;
    Ok(Json(queue))
}

/// DELETE /guilds/:guild_id/queue/:position
pub async fn remove_from_queue(
    State(state): State<AppState>,
    Path((guild_id, position)): Path<(String, usize)>,
) -> Result<Json<TrackResponse>, ApiError> {
    let track = state.commands.remove(parse_guild(&guild_id)?, position).await?;
    info!(guild = %guild_id, position, "Removed via API");
    Ok(Json(TrackResponse { track }))
}

/// POST /guilds/:guild_id/volume
pub async fn set_volume(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<VolumeResponse>, ApiError> {
    let percent = state.commands.set_volume(parse_guild(&guild_id)?, req.percent).await?;
    Ok(Json(VolumeResponse { percent }))
}

/// POST /guilds/:guild_id/loop
pub async fn set_loop(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Json(req): Json<LoopRequest>,
) -> Result<Json<LoopResponse>, ApiError> {
    let enabled = state.commands.set_loop(parse_guild(&guild_id)?, req.enabled).await?;
    Ok(Json(LoopResponse { enabled }))
}

/// GET /guilds/:guild_id/now-playing
pub async fn now_playing(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<Json<NowPlaying>, ApiError> {
    let now = state.commands.now_playing(parse_guild(&guild_id)?).await?;
    Ok(Json(now))
}

/// POST /guilds/:guild_id/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.commands.disconnect(parse_guild(&guild_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

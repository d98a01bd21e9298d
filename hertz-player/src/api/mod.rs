//! HTTP command surface
//!
//! Per-guild control endpoints plus an SSE stream of session events.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use hertz_common::events::EventBus;
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::commands::MusicCommands;
use crate::Error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub commands: MusicCommands,
    pub events: EventBus,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/guilds/:guild_id",
            Router::new()
                .route("/play", post(handlers::play))
                .route("/skip", post(handlers::skip))
                .route("/queue", get(handlers::get_queue))
                .route("/queue/:position", delete(handlers::remove_from_queue))
                .route("/volume", post(handlers::set_volume))
                .route("/loop", post(handlers::set_loop))
                .route("/now-playing", get(handlers::now_playing))
                .route("/disconnect", post(handlers::disconnect)),
        )
        .route("/events", get(sse::event_stream))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.port));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.commands.registry().len().await;
    Json(json!({
        "status": "ok",
        "module": "hertz-player",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "sessions": sessions,
        "event_subscribers": state.events.subscriber_count(),
    }))
}

/// Error response: status code chosen by error kind, body carries the
/// user-facing message only
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::ResolutionFailure(_) => StatusCode::NOT_FOUND,
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NothingPlaying => StatusCode::CONFLICT,
            Error::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
            Error::VoiceJoinFailure(_) | Error::PlaybackStartFailure(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Http(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = Json(json!({
            "status": "error",
            "message": self.0.user_message(),
        }));
        (status, body).into_response()
    }
}

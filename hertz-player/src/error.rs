//! Error types for hertz-player
//!
//! Every failure is recovered at the session boundary; the command layer
//! only ever shows [`Error::user_message`] to users.

use thiserror::Error;

/// Main error type for hertz-player
#[derive(Error, Debug)]
pub enum Error {
    /// Track resolver found nothing for the query
    #[error("No results found for '{0}'")]
    ResolutionFailure(String),

    /// Playback driver could not attach to a voice channel
    #[error("Voice join failed: {0}")]
    VoiceJoinFailure(String),

    /// Playback driver failed to start a specific track
    #[error("Playback start failed: {0}")]
    PlaybackStartFailure(String),

    /// Out-of-range index, page, or level
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation needs a current track and there is none
    #[error("Nothing is playing")]
    NothingPlaying,

    /// Session actor has stopped and no longer accepts commands
    #[error("Session closed")]
    SessionClosed,

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File and process I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Message safe to show to the person who issued the command
    pub fn user_message(&self) -> String {
        match self {
            Error::ResolutionFailure(_) => "No results found".to_string(),
            Error::VoiceJoinFailure(reason) => format!("Failed to join voice: {}", reason),
            Error::PlaybackStartFailure(reason) => format!("Playback error: {}", reason),
            Error::InvalidArgument(msg) => msg.clone(),
            Error::NothingPlaying => "No track currently playing".to_string(),
            Error::SessionClosed => "The player for this server is shutting down".to_string(),
            Error::Config(_) | Error::Http(_) | Error::Io(_) | Error::Internal(_) => {
                "Something went wrong, please try again".to_string()
            }
        }
    }
}

impl From<hertz_common::Error> for Error {
    fn from(err: hertz_common::Error) -> Self {
        match err {
            hertz_common::Error::Io(e) => Error::Io(e),
            hertz_common::Error::Config(msg) => Error::Config(msg),
            hertz_common::Error::InvalidInput(msg) => Error::InvalidArgument(msg),
        }
    }
}

/// Convenience Result type using hertz-player Error
pub type Result<T> = std::result::Result<T, Error>;

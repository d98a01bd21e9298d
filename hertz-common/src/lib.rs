//! # Hertz Common Library
//!
//! Shared code for the Hertz playback service:
//! - Track model (resolved tracks, requesters, guild ids)
//! - Event types (HertzEvent enum) and the EventBus
//! - Bootstrap configuration loading
//! - Human-readable duration formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod time;
pub mod track;

pub use error::{Error, Result};
pub use track::{GuildId, Requester, ResolvedTrack, Track, TrackOrigin};

//! # Hertz Player Library (hertz-player)
//!
//! Per-guild playback session manager for a voice bot.
//!
//! **Purpose:** Keep one strictly-ordered playback queue per guild, drive a
//! pluggable playback driver through it, and expose play/skip/remove/volume/
//! loop/queue/disconnect commands over HTTP with an SSE event stream.
//!
//! **Architecture:** One tokio actor per guild session; the registry maps
//! guild ids to session handles; drivers report completions back into the
//! owning session's message queue.

pub mod api;
pub mod commands;
pub mod driver;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod resolver;
pub mod session;

pub use error::{Error, Result};
pub use registry::SessionRegistry;

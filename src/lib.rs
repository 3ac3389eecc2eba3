#![deny(missing_docs)]
//! Mediagrab - Telegram media download bot
//!
//! A Telegram bot that accepts media links from a fixed set of platforms,
//! offers an MP3/MP4 choice via an inline keyboard, fetches the media
//! through an external yt-dlp binary, and delivers the result back through
//! the chat, subject to a 50 MiB delivery limit.

/// Telegram bot implementation
pub mod bot;
/// URL classification for inbound messages
pub mod classify;
/// Configuration management
pub mod config;
/// Media fetching, download jobs, and the size gate
pub mod download;
/// Per-conversation pending-request state
pub mod session;
pub mod utils;

//! User-facing texts and keyboards.
//!
//! All strings the bot shows to users live here, so the handlers stay
//! free of copy and the tests can assert on exact message shapes.

use crate::download::error::DownloadError;
use crate::download::FormatClass;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Greeting shown on `/start`.
#[must_use]
pub fn welcome() -> &'static str {
    "🖐 Yooo bro! Send me a link from:\n\
     YouTube | TikTok | Instagram | Facebook\n\
     I'll download it as MP3 or MP4 for you!"
}

/// Prompt accompanying the format keyboard.
#[must_use]
pub fn choose_format() -> &'static str {
    "Choose format:"
}

/// Rejection reply for a message without a supported URL.
#[must_use]
pub fn unsupported_url() -> &'static str {
    "❌ Unsupported URL. Send valid link from:\nYouTube/TikTok/Instagram/Facebook"
}

/// Reply for a format choice that arrived with no pending URL.
#[must_use]
pub fn resend_link() -> &'static str {
    "❌ URL missing. Send link again"
}

/// Status edit shown while the fetch runs.
#[must_use]
pub fn downloading(format: FormatClass) -> String {
    format!("⬇️ Downloading {}...", format.as_str().to_uppercase())
}

/// Status edit shown after a successful delivery.
#[must_use]
pub fn download_complete(format: FormatClass) -> String {
    format!("✅ {} download complete!", format.as_str().to_uppercase())
}

/// Status edit for a failed download cycle, one message per error kind.
#[must_use]
pub fn cycle_failed(err: &DownloadError) -> String {
    match err {
        DownloadError::SizeExceeded { size_mib, limit_mib } => {
            format!("❌ File too big ({size_mib:.1}MB > {limit_mib}MB)")
        }
        DownloadError::Fetch(e) => format!("❌ Error: {e}"),
        DownloadError::Delivery(e) => format!("❌ Error: {e}"),
    }
}

/// Inline keyboard offering the two output formats.
#[must_use]
pub fn format_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("MP3 🎵", FormatClass::Audio.as_str()),
        InlineKeyboardButton::callback("MP4 🎬", FormatClass::Video.as_str()),
    ]])
}

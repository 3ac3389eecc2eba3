//! Media download pipeline.
//!
//! Format classes, the delivery size gate, and the fetch-and-gate half of
//! one download cycle. Transport delivery stays in the bot handlers; this
//! module never touches Telegram.

/// Error taxonomy for the download pipeline
pub mod error;
/// Media fetcher adapter over the external yt-dlp binary
pub mod fetcher;
/// Scratch-directory ownership for one download job
pub mod job;

use crate::config::{DELIVERY_LIMIT_MIB, MIB};
use self::error::{DownloadError, FetchError};
use self::fetcher::MediaFetcher;
use self::job::DownloadJob;
use std::path::PathBuf;

/// The user's choice between audio-only and muxed video output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    /// Audio-only MP3 extraction
    Audio,
    /// Muxed video+audio MP4
    Video,
}

impl FormatClass {
    /// Parses the two-valued callback payload (`mp3` / `mp4`).
    #[must_use]
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            "mp3" => Some(Self::Audio),
            "mp4" => Some(Self::Video),
            _ => None,
        }
    }

    /// The callback payload and target file extension for this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }
}

/// Checks a produced file's on-disk size against the delivery limit.
///
/// The size is converted to mebibytes and compared strictly greater-than,
/// so a file of exactly 50 MiB still passes.
///
/// # Errors
///
/// Returns [`DownloadError::SizeExceeded`] carrying the measured size.
pub fn size_gate(size_bytes: u64) -> Result<(), DownloadError> {
    let size_mib = size_bytes as f64 / MIB as f64;
    if size_mib > DELIVERY_LIMIT_MIB as f64 {
        return Err(DownloadError::SizeExceeded {
            size_mib,
            limit_mib: DELIVERY_LIMIT_MIB,
        });
    }
    Ok(())
}

/// Runs the fetch for one job and applies the size gate to the result.
///
/// This is the non-transport half of a download cycle: on success the
/// returned path lives inside the job's scratch directory and is ready for
/// delivery. The caller owns scratch-directory cleanup on all paths.
///
/// # Errors
///
/// Returns [`DownloadError::Fetch`] when the fetcher fails and
/// [`DownloadError::SizeExceeded`] when the produced file is over the
/// limit.
pub async fn fetch_gated(
    fetcher: &dyn MediaFetcher,
    url: &str,
    format: FormatClass,
    job: &DownloadJob,
) -> Result<PathBuf, DownloadError> {
    let path = fetcher.fetch(url, format, job.work_dir()).await?;
    let size_bytes = tokio::fs::metadata(&path)
        .await
        .map_err(FetchError::Io)?
        .len();
    size_gate(size_bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_class_callback_round_trip() {
        assert_eq!(FormatClass::from_callback_data("mp3"), Some(FormatClass::Audio));
        assert_eq!(FormatClass::from_callback_data("mp4"), Some(FormatClass::Video));
        assert_eq!(FormatClass::from_callback_data("flac"), None);
        assert_eq!(FormatClass::Audio.as_str(), "mp3");
        assert_eq!(FormatClass::Video.as_str(), "mp4");
    }

    #[test]
    fn test_size_gate_accepts_exactly_50_mib() {
        assert!(size_gate(50 * MIB).is_ok());
    }

    #[test]
    fn test_size_gate_rejects_one_byte_over() {
        let err = size_gate(50 * MIB + 1).expect_err("one byte over the limit must be rejected");
        match err {
            DownloadError::SizeExceeded { size_mib, limit_mib } => {
                assert!(size_mib > 50.0);
                assert_eq!(limit_mib, 50);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_size_gate_accepts_small_file() {
        assert!(size_gate(3 * MIB).is_ok());
    }
}

//! Media fetcher adapter over the external yt-dlp binary.
//!
//! Wraps the extraction/download capability behind the [`MediaFetcher`]
//! contract: given a URL and a format class, produce a file inside the
//! provided scratch directory or fail with a classified [`FetchError`].
//! Transcoding is yt-dlp's own ffmpeg post-processing; nothing here parses
//! media.

use crate::config::{AUDIO_BITRATE, FETCH_MAX_FILESIZE_BYTES, TITLE_MAX_CHARS};
use crate::download::error::FetchError;
use crate::download::FormatClass;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Contract for the external media extraction/download capability.
///
/// Implementations must confine all output to `scratch_dir` and fetch a
/// single item only (never a playlist).
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetches `url` as `format` into `scratch_dir`, returning the path of
    /// the produced file.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on any underlying failure: network,
    /// unsupported content, extraction, transcoding, or the fetcher's own
    /// size ceiling.
    async fn fetch(
        &self,
        url: &str,
        format: FormatClass,
        scratch_dir: &Path,
    ) -> Result<PathBuf, FetchError>;
}

/// Production fetcher shelling out to yt-dlp.
pub struct YtDlpFetcher {
    bin: String,
}

impl YtDlpFetcher {
    /// Creates a fetcher invoking the given binary (usually `yt-dlp`).
    #[must_use]
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        url: &str,
        format: FormatClass,
        scratch_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        let args = build_args(url, format, scratch_dir);
        debug!(bin = %self.bin, ?args, "invoking media fetcher");

        let output = Command::new(&self.bin)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Launch {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let cause = extraction_cause(&stderr);
            warn!(%cause, %url, "media fetcher failed");
            return Err(FetchError::Extraction(cause));
        }

        // --print filename puts the declared output path on stdout;
        // progress lines may precede it, the path is the last one.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let declared = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .map(|line| PathBuf::from(line.trim()))
            .ok_or(FetchError::MissingOutput)?;

        resolve_output(scratch_dir, &declared, format)
    }
}

/// Builds the full yt-dlp argument vector for one fetch.
///
/// The output template confines downloads to the scratch directory and
/// bounds the title-derived file name to a filesystem-safe character set
/// and length; `--no-simulate --print filename` makes yt-dlp report the
/// pre-post-processing output path on stdout while still downloading.
fn build_args(url: &str, format: FormatClass, scratch_dir: &Path) -> Vec<String> {
    let template = scratch_dir.join(format!("%(title).{TITLE_MAX_CHARS}s.%(ext)s"));
    let mut args = vec![
        "--output".to_owned(),
        template.to_string_lossy().into_owned(),
        "--no-playlist".to_owned(),
        "--restrict-filenames".to_owned(),
        "--max-filesize".to_owned(),
        FETCH_MAX_FILESIZE_BYTES.to_string(),
        "--no-warnings".to_owned(),
        "--newline".to_owned(),
        "--no-simulate".to_owned(),
        "--print".to_owned(),
        "filename".to_owned(),
    ];

    match format {
        FormatClass::Audio => args.extend([
            "--extract-audio".to_owned(),
            "--audio-format".to_owned(),
            "mp3".to_owned(),
            "--audio-quality".to_owned(),
            AUDIO_BITRATE.to_owned(),
        ]),
        FormatClass::Video => args.extend([
            "--format".to_owned(),
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]".to_owned(),
            "--merge-output-format".to_owned(),
            "mp4".to_owned(),
        ]),
    }

    args.push(url.to_owned());
    args
}

/// Distills yt-dlp stderr into a short cause line: the first `ERROR` line
/// when present, otherwise the last non-empty line.
fn extraction_cause(stderr: &str) -> String {
    stderr
        .lines()
        .find(|line| line.contains("ERROR"))
        .or_else(|| stderr.lines().rev().find(|line| !line.trim().is_empty()))
        .unwrap_or("fetcher failed without diagnostics")
        .trim()
        .to_owned()
}

/// Resolves the on-disk output file from the path the fetcher declared.
///
/// Post-processing can change the extension after the name was declared:
/// audio extraction always re-containers to mp3, and a webm source merged
/// into mp4 keeps the declared stem only. The audio scan picks the
/// lexicographically first match so the result never depends on directory
/// enumeration order.
fn resolve_output(
    scratch_dir: &Path,
    declared: &Path,
    format: FormatClass,
) -> Result<PathBuf, FetchError> {
    match format {
        FormatClass::Video => {
            if declared.is_file() {
                return Ok(declared.to_path_buf());
            }
            if let Some(swapped) = swap_extension(declared, "webm", "mp4") {
                if swapped.is_file() {
                    return Ok(swapped);
                }
            }
            Err(FetchError::MissingOutput)
        }
        FormatClass::Audio => {
            let mut candidates: Vec<PathBuf> = std::fs::read_dir(scratch_dir)?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
                })
                .collect();
            candidates.sort();
            if let Some(first) = candidates.into_iter().next() {
                return Ok(first);
            }

            for source_ext in ["webm", "m4a"] {
                if let Some(swapped) = swap_extension(declared, source_ext, "mp3") {
                    if swapped.is_file() {
                        return Ok(swapped);
                    }
                }
            }
            Err(FetchError::MissingOutput)
        }
    }
}

fn swap_extension(path: &Path, from: &str, to: &str) -> Option<PathBuf> {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(from))
        .then(|| path.with_extension(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_common() {
        let dir = Path::new("/tmp/job");
        let args = build_args("https://youtu.be/x", FormatClass::Audio, dir);

        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(args.contains(&"--restrict-filenames".to_string()));
        assert!(args.contains(&"52428800".to_string()));
        assert!(args.contains(&"--no-simulate".to_string()));
        assert_eq!(args.last(), Some(&"https://youtu.be/x".to_string()));

        let template_pos = args
            .iter()
            .position(|a| a == "--output")
            .expect("output flag present");
        let template = &args[template_pos + 1];
        assert!(template.starts_with("/tmp/job"));
        assert!(template.contains("%(title).70s.%(ext)s"));
    }

    #[test]
    fn test_build_args_audio_extraction() {
        let args = build_args("u", FormatClass::Audio, Path::new("/tmp/j"));
        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(args.contains(&"mp3".to_string()));
        assert!(args.contains(&"192K".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_build_args_video_merge() {
        let args = build_args("u", FormatClass::Video, Path::new("/tmp/j"));
        assert!(args.contains(&"bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]".to_string()));
        assert!(args.contains(&"--merge-output-format".to_string()));
        assert!(!args.contains(&"--extract-audio".to_string()));
    }

    #[test]
    fn test_extraction_cause_prefers_error_line() {
        let stderr = "[youtube] extracting\nERROR: Unsupported URL: https://x\ntrailing";
        assert_eq!(extraction_cause(stderr), "ERROR: Unsupported URL: https://x");
    }

    #[test]
    fn test_extraction_cause_falls_back_to_last_line() {
        let stderr = "something went wrong\n\n";
        assert_eq!(extraction_cause(stderr), "something went wrong");
        assert_eq!(extraction_cause(""), "fetcher failed without diagnostics");
    }

    #[test]
    fn test_resolve_video_prefers_declared() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let declared = dir.path().join("clip.mp4");
        std::fs::write(&declared, b"v")?;

        let resolved = resolve_output(dir.path(), &declared, FormatClass::Video)
            .expect("declared file resolves");
        assert_eq!(resolved, declared);
        Ok(())
    }

    #[test]
    fn test_resolve_video_substitutes_webm() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let declared = dir.path().join("clip.webm");
        std::fs::write(dir.path().join("clip.mp4"), b"v")?;

        let resolved = resolve_output(dir.path(), &declared, FormatClass::Video)
            .expect("merged mp4 resolves");
        assert_eq!(resolved, dir.path().join("clip.mp4"));
        Ok(())
    }

    #[test]
    fn test_resolve_video_missing_output() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let declared = dir.path().join("clip.webm");
        let err = resolve_output(dir.path(), &declared, FormatClass::Video)
            .expect_err("nothing on disk");
        assert!(matches!(err, FetchError::MissingOutput));
        Ok(())
    }

    #[test]
    fn test_resolve_audio_picks_lexicographically_first_mp3() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("b_track.mp3"), b"a")?;
        std::fs::write(dir.path().join("a_track.mp3"), b"a")?;
        std::fs::write(dir.path().join("cover.webp"), b"x")?;
        let declared = dir.path().join("b_track.m4a");

        let resolved = resolve_output(dir.path(), &declared, FormatClass::Audio)
            .expect("mp3 scan resolves");
        assert_eq!(resolved, dir.path().join("a_track.mp3"));
        Ok(())
    }

    #[test]
    fn test_resolve_audio_missing_output() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("track.m4a"), b"a")?;
        let declared = dir.path().join("track.m4a");

        let err = resolve_output(dir.path(), &declared, FormatClass::Audio)
            .expect_err("no mp3 anywhere");
        assert!(matches!(err, FetchError::MissingOutput));
        Ok(())
    }
}

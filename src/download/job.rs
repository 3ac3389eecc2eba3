//! Scratch-directory ownership for one download job.

use std::io;
use std::path::Path;
use tempfile::TempDir;
use tracing::warn;

/// Exclusively-owned scratch directory for a single download attempt.
///
/// The directory is created immediately before the fetcher is invoked and
/// must be gone by the time the controller returns control to the
/// dispatcher, whatever the outcome: the explicit [`cleanup`] covers the
/// normal exit paths and the `Drop` of the inner [`TempDir`] backstops
/// early returns. Removal is best-effort; failures are logged and never
/// surfaced to the user.
///
/// [`cleanup`]: DownloadJob::cleanup
pub struct DownloadJob {
    dir: TempDir,
}

impl DownloadJob {
    /// Creates a fresh scratch directory for one download attempt.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when the directory cannot be created.
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("mediagrab-").tempdir()?;
        Ok(Self { dir })
    }

    /// The scratch directory the fetcher must confine its output to.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the scratch directory and everything under it.
    ///
    /// Safe to call more than once: a directory that is already gone is
    /// not an error, and any other failure is swallowed after a warning.
    pub fn cleanup(&self) {
        if let Err(e) = std::fs::remove_dir_all(self.dir.path()) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    "failed to remove scratch dir {}: {e}",
                    self.dir.path().display()
                );
            }
        }
    }
}

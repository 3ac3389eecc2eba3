//! Error taxonomy for the download pipeline.
//!
//! Callers distinguish a failed fetch from an oversized result from a
//! failed delivery instead of collapsing them into one message; the bot
//! layer maps each variant to its own user-facing status text.

use std::io;
use thiserror::Error;

/// Failure raised by the media fetcher adapter.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetcher binary could not be started.
    #[error("failed to launch {bin}: {source}")]
    Launch {
        /// Binary that failed to spawn
        bin: String,
        /// Underlying process error
        #[source]
        source: io::Error,
    },

    /// The fetcher ran but reported a failure (network, unsupported
    /// content, extraction, or its own size ceiling).
    #[error("{0}")]
    Extraction(String),

    /// The fetcher reported success but no output file could be resolved
    /// in the scratch directory.
    #[error("no output file produced")]
    MissingOutput,

    /// Filesystem inspection of the produced file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure of one download cycle, distinguished per outcome.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The fetch itself failed; nothing was produced.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetch succeeded but the file is over the delivery limit.
    #[error("file exceeds delivery limit: {size_mib:.1}MB > {limit_mib}MB")]
    SizeExceeded {
        /// Measured size of the produced file, in mebibytes
        size_mib: f64,
        /// Delivery limit, in mebibytes
        limit_mib: u64,
    },

    /// The transport send failed after a successful, size-compliant fetch.
    #[error("delivery failed: {0}")]
    Delivery(#[from] teloxide::RequestError),
}

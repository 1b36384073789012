//! Error types for the conversion pipeline.
//!
//! Everything that can go wrong while converting a single task is an
//! [`Error`]. The scheduler turns these into failed
//! [`TaskResult`](crate::TaskResult)s; they never abort a run on their own.

use std::path::PathBuf;

/// Failure while retrieving icon markup.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The local path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The local path exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URL uses a scheme we cannot retrieve from.
    #[error("unsupported URL scheme `{scheme}` in {url}")]
    UnsupportedScheme { scheme: String, url: String },
}

/// Failure of a single conversion step.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The markup has no `svg` element or is not well-formed.
    #[error("malformed markup: {0}")]
    MalformedMarkup(String),

    /// Pixel buffer allocation, composition or PNG encoding failed.
    #[error("raster error: {0}")]
    Raster(String),

    /// The output file (or directory) could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

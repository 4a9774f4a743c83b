// Error types for the media source, the item pipeline and the run as a whole

use std::path::PathBuf;

use thiserror::Error;

use super::models::DownloadType;

/// Transport-level failure reported by a media source.
///
/// These are wrapped by [`DownloadError`] and [`RunError`]; nothing in the
/// downloader looks inside them beyond printing.
#[derive(Debug, Error)]
pub enum SourceError {
    /// yt-dlp not found or not executable
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Command ran but exited unsuccessfully
    #[error("Execution error: {0}")]
    Execution(String),

    /// Failed to parse the tool's JSON output
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP request could not be completed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Failure of a single playlist item. Recorded in that item's outcome and
/// never propagated past the pipeline.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to get video info: {0}")]
    MetadataFetch(#[source] SourceError),

    #[error("no suitable {download_type} format found")]
    NoSuitableFormat { download_type: DownloadType },

    #[error("failed to get stream: {0}")]
    StreamOpen(#[source] SourceError),

    #[error("failed to save {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Conditions that end the whole run before any item is attempted.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Config(String),

    #[error("failed to get playlist: {0}")]
    PlaylistResolution(#[source] SourceError),

    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// Media source and progress trait definitions

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::errors::SourceError;
use super::models::{EncodingDescriptor, Playlist, PlaylistRef, ResolvedItem};
use super::utils::format_elapsed;

/// Raw media bytes, read chunk by chunk
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Remote metadata and streaming client
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Resolve a playlist to its items, in playlist order
    async fn resolve_playlist(&self, playlist: &PlaylistRef) -> Result<Playlist, SourceError>;

    /// Resolve one item to its title and available encodings
    async fn resolve_item(&self, item_id: &str) -> Result<ResolvedItem, SourceError>;

    /// Open the byte stream of one encoding of a resolved item
    async fn open_stream(
        &self,
        item: &ResolvedItem,
        encoding: &EncodingDescriptor,
    ) -> Result<ByteStream, SourceError>;
}

/// Progress notifications emitted while a playlist downloads
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    PlaylistFetching {
        reference: String,
    },
    PlaylistResolved {
        title: String,
        count: usize,
    },
    ItemStarted {
        position: usize,
        total: usize,
        title: String,
    },
    ItemCompleted {
        position: usize,
        total: usize,
        title: String,
        elapsed: Duration,
        path: PathBuf,
    },
    ItemFailed {
        position: usize,
        total: usize,
        title: String,
        elapsed: Duration,
        error: String,
    },
}

/// Receiver of progress events. Called concurrently from every worker.
pub trait ProgressEmitter: Send + Sync {
    fn emit(&self, event: DownloadEvent);
}

/// Prints progress as plain lines: progress on stdout, failures on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEmitter;

impl ProgressEmitter for ConsoleEmitter {
    fn emit(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::PlaylistFetching { reference } => {
                println!("Fetching playlist info: {}", reference);
            }
            DownloadEvent::PlaylistResolved { title, count } => {
                println!("Playlist: {}", title);
                println!("Videos: {}", count);
            }
            DownloadEvent::ItemStarted {
                position,
                total,
                title,
            } => {
                println!("\n[{}/{}] Downloading: {}", position, total, title);
            }
            DownloadEvent::ItemCompleted { elapsed, title, .. } => {
                println!("✓ Completed in {}: {}", format_elapsed(elapsed), title);
            }
            DownloadEvent::ItemFailed { title, error, .. } => {
                eprintln!("❌ Failed to download {}: {}", title, error);
            }
        }
    }
}

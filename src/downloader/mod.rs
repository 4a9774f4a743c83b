// Downloader module - playlist orchestration over a pluggable media source

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod paths;
pub mod pipeline;
pub mod traits;
pub mod utils;

pub use errors::{DownloadError, RunError, SourceError};
pub use extractors::YtDlpSource;
pub use format_selector::FormatSelector;
pub use models::{
    DownloadConfig, DownloadOutcome, DownloadType, EncodingDescriptor, NetworkConfig, Playlist,
    PlaylistItem, PlaylistRef, ResolvedItem, RunSummary,
};
pub use orchestrator::PlaylistDownloader;
pub use paths::PathRegistry;
pub use pipeline::ItemPipeline;
pub use traits::{ByteStream, ConsoleEmitter, DownloadEvent, MediaSource, ProgressEmitter};
pub use utils::sanitize_file_name;

// Common data models for downloader

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Quality label the source gives its smallest renditions.
pub const LOWEST_QUALITY: &str = "tiny";

/// Parallel downloads when none is configured
pub const DEFAULT_PARALLEL: NonZeroUsize = match NonZeroUsize::new(3) {
    Some(n) => n,
    None => unreachable!(),
};

/// Playlist URL or bare playlist ID, as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef(String);

impl PlaylistRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a resolved playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub id: String,
    pub title: String,
    /// 1-based position in the playlist
    pub position: usize,
}

/// Resolved playlist
#[derive(Debug, Clone)]
pub struct Playlist {
    pub title: String,
    pub items: Vec<PlaylistItem>,
}

/// One fetchable representation of an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingDescriptor {
    /// Source format ID (e.g., "140", "251")
    pub format_id: String,
    /// Media type, e.g. `audio/mp4; codecs="mp4a.40.2"` or `video/webm`
    pub mime_type: String,
    /// Quality label (tiny, small, medium, large, hd720, ...)
    pub quality: String,
    /// Number of audio channels, 0 when the stream carries no audio
    pub audio_channels: u32,
    /// Direct stream URL
    pub url: String,
    /// Headers the source expects when the stream is fetched
    pub http_headers: HashMap<String, String>,
}

impl EncodingDescriptor {
    pub fn is_audio_only(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn has_audio(&self) -> bool {
        self.audio_channels > 0
    }

    pub fn is_lowest_quality(&self) -> bool {
        self.quality == LOWEST_QUALITY
    }
}

/// Item metadata with every available encoding, in source order
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub id: String,
    pub title: String,
    pub encodings: Vec<EncodingDescriptor>,
}

/// What to fetch for every item of the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadType {
    Audio,
    #[default]
    Video,
}

impl DownloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            _ => Err("Download type must be 'audio' or 'video'".to_string()),
        }
    }
}

/// Run-wide download options. Built once, then shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    pub download_type: DownloadType,
    /// Maximum number of items downloading at once
    pub parallel: NonZeroUsize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./downloads"),
            download_type: DownloadType::Video,
            parallel: DEFAULT_PARALLEL,
        }
    }
}

impl DownloadConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_download_type(mut self, download_type: DownloadType) -> Self {
        self.download_type = download_type;
        self
    }

    pub fn with_parallel(mut self, parallel: NonZeroUsize) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Network configuration for the media source
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    /// HTTP or SOCKS5 proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Socket timeout handed to yt-dlp, in seconds
    pub socket_timeout: Option<u32>,
}

impl NetworkConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: Option<u32>) -> Self {
        self.socket_timeout = seconds;
        self
    }
}

/// Result of processing one playlist item
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub item_id: String,
    pub title: String,
    pub success: bool,
    pub elapsed: Duration,
    pub error: Option<String>,
    pub path: Option<PathBuf>,
}

impl DownloadOutcome {
    pub fn succeeded(item: &PlaylistItem, elapsed: Duration, path: PathBuf) -> Self {
        Self {
            item_id: item.id.clone(),
            title: item.title.clone(),
            success: true,
            elapsed,
            error: None,
            path: Some(path),
        }
    }

    pub fn failed(item: &PlaylistItem, elapsed: Duration, error: impl fmt::Display) -> Self {
        Self {
            item_id: item.id.clone(),
            title: item.title.clone(),
            success: false,
            elapsed,
            error: Some(error.to_string()),
            path: None,
        }
    }
}

/// Aggregate over every outcome of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub playlist_title: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Titles of failed items, in the order they failed
    pub failed_titles: Vec<String>,
    pub outcomes: Vec<DownloadOutcome>,
}

impl RunSummary {
    /// `outcomes` must be in completion order.
    pub fn from_outcomes(playlist_title: impl Into<String>, outcomes: Vec<DownloadOutcome>) -> Self {
        let failed_titles: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.title.clone())
            .collect();

        Self {
            playlist_title: playlist_title.into(),
            total: outcomes.len(),
            successful: outcomes.len() - failed_titles.len(),
            failed: failed_titles.len(),
            failed_titles,
            outcomes,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Download Summary ===")?;
        writeln!(f, "Total videos: {}", self.total)?;
        writeln!(f, "Successful: {}", self.successful)?;
        writeln!(f, "Failed: {}", self.failed)?;

        if !self.failed_titles.is_empty() {
            writeln!(f, "Failed videos:")?;
            for title in &self.failed_titles {
                writeln!(f, "  - {}", title)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, title: &str) -> PlaylistItem {
        PlaylistItem {
            id: id.to_string(),
            title: title.to_string(),
            position: 1,
        }
    }

    #[test]
    fn test_download_type_parsing() {
        assert_eq!("audio".parse::<DownloadType>(), Ok(DownloadType::Audio));
        assert_eq!("video".parse::<DownloadType>(), Ok(DownloadType::Video));
        assert!("Video".parse::<DownloadType>().is_err());
        assert!("mp3".parse::<DownloadType>().is_err());
    }

    #[test]
    fn test_summary_keeps_failure_order() {
        let outcomes = vec![
            DownloadOutcome::failed(&item("b", "Second"), Duration::from_secs(1), "boom"),
            DownloadOutcome::succeeded(&item("a", "First"), Duration::from_secs(2), "a.mp4".into()),
            DownloadOutcome::failed(&item("c", "Third"), Duration::from_secs(1), "boom"),
        ];

        let summary = RunSummary::from_outcomes("Mix", outcomes);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.failed_titles, vec!["Second", "Third"]);

        let text = summary.to_string();
        assert!(text.contains("Total videos: 3"));
        assert!(text.contains("  - Second\n  - Third\n"));
        assert!(!text.contains("Download time"));
    }

    #[test]
    fn test_empty_summary_has_no_failed_section() {
        let summary = RunSummary::from_outcomes("Empty", Vec::new());
        assert_eq!(summary.total, 0);
        assert!(!summary.to_string().contains("Failed videos"));
    }
}

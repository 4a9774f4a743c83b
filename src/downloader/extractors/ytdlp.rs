// yt-dlp media source
//
// Metadata comes from the `yt-dlp` binary (`--dump-single-json` for playlists,
// `--dump-json` for single videos). The media bytes are fetched directly over
// HTTP from the format URL yt-dlp reports, with the headers it asks for.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::downloader::errors::SourceError;
use crate::downloader::models::{
    EncodingDescriptor, NetworkConfig, Playlist, PlaylistItem, PlaylistRef, ResolvedItem,
    LOWEST_QUALITY,
};
use crate::downloader::traits::{ByteStream, MediaSource};
use crate::downloader::utils::{get_proxy_args, get_timeout_args, run_output};

lazy_static::lazy_static! {
    static ref PLAYLIST_ID_RE: Regex =
        Regex::new(r"^(?:PL|LL|EC|UU|FL|RD|UL|TL|PU|OLAK5uy_)[0-9A-Za-z_-]{10,}$").unwrap();
    static ref VIDEO_ID_RE: Regex = Regex::new(r"^[0-9A-Za-z_-]{11}$").unwrap();
}

/// Media source backed by the yt-dlp binary and a plain HTTP client
pub struct YtDlpSource {
    ytdlp_path: String,
    network: NetworkConfig,
    http: reqwest::Client,
}

impl YtDlpSource {
    /// `ytdlp_path` overrides the binary lookup.
    pub fn new(ytdlp_path: Option<String>, network: NetworkConfig) -> Result<Self, SourceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = network.proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            ytdlp_path: ytdlp_path.unwrap_or_else(Self::find_ytdlp),
            network,
            http: builder.build()?,
        })
    }

    pub fn ytdlp_path(&self) -> &str {
        &self.ytdlp_path
    }

    /// Find yt-dlp binary
    fn find_ytdlp() -> String {
        let common_paths = [
            "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
            "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
            "/usr/bin/yt-dlp",          // System installation
        ];

        for path in common_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }

        // Resolved through PATH when spawned
        "yt-dlp".to_string()
    }

    /// Build command arguments
    fn build_args(&self, mode: &[&str], url: &str) -> Vec<String> {
        let mut args: Vec<String> = mode.iter().map(|s| s.to_string()).collect();
        args.push("--no-warnings".to_string());
        args.extend(get_timeout_args(&self.network));
        args.extend(get_proxy_args(&self.network));
        args.push(url.to_string());
        args
    }

    async fn dump_json(&self, mode: &[&str], url: &str) -> Result<Vec<u8>, SourceError> {
        let args = self.build_args(mode, url);
        let output = run_output(&self.ytdlp_path, &args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Execution(stderr.trim().to_string()));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve_playlist(&self, playlist: &PlaylistRef) -> Result<Playlist, SourceError> {
        let url = playlist_url(playlist.as_str());
        let stdout = self
            .dump_json(&["--flat-playlist", "--dump-single-json"], &url)
            .await?;
        parse_playlist(&stdout)
    }

    async fn resolve_item(&self, item_id: &str) -> Result<ResolvedItem, SourceError> {
        let url = video_url(item_id);
        let stdout = self.dump_json(&["--dump-json", "--no-playlist"], &url).await?;
        parse_video(&stdout, item_id)
    }

    async fn open_stream(
        &self,
        item: &ResolvedItem,
        encoding: &EncodingDescriptor,
    ) -> Result<ByteStream, SourceError> {
        debug!(item = %item.id, format = %encoding.format_id, "opening stream");

        let mut request = self.http.get(&encoding.url);
        for (name, value) in &encoding.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status,
                url: strip_query(&encoding.url).to_string(),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed())
    }
}

/// Canonical playlist URL for a bare playlist ID; anything else is passed through
pub fn playlist_url(reference: &str) -> String {
    if PLAYLIST_ID_RE.is_match(reference) {
        format!("https://www.youtube.com/playlist?list={}", reference)
    } else {
        reference.to_string()
    }
}

/// Watch URL for a bare video ID; anything else is passed through
pub fn video_url(item_id: &str) -> String {
    if VIDEO_ID_RE.is_match(item_id) {
        format!("https://www.youtube.com/watch?v={}", item_id)
    } else {
        item_id.to_string()
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    title: Option<String>,
    #[serde(default)]
    entries: Vec<Option<FlatEntry>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoJson {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    formats: Vec<FormatJson>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    format_id: Option<String>,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    audio_channels: Option<u32>,
    url: Option<String>,
    protocol: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

fn parse_playlist(stdout: &[u8]) -> Result<Playlist, SourceError> {
    let flat: FlatPlaylist = serde_json::from_slice(stdout)
        .map_err(|e| SourceError::Parse(format!("Invalid playlist JSON: {}", e)))?;

    let items = flat
        .entries
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            // Non-YouTube extractors may give IDs yt-dlp cannot resolve alone
            let id = match (entry.id, entry.url) {
                (Some(id), _) if VIDEO_ID_RE.is_match(&id) => id,
                (_, Some(url)) => url,
                (Some(id), None) => id,
                (None, None) => return None,
            };
            Some((id, entry.title))
        })
        .enumerate()
        .map(|(index, (id, title))| PlaylistItem {
            id,
            title: title.unwrap_or_else(|| "Unknown".to_string()),
            position: index + 1,
        })
        .collect();

    Ok(Playlist {
        title: flat.title.unwrap_or_else(|| "Unknown".to_string()),
        items,
    })
}

fn parse_video(stdout: &[u8], item_id: &str) -> Result<ResolvedItem, SourceError> {
    let video: VideoJson = serde_json::from_slice(stdout)
        .map_err(|e| SourceError::Parse(format!("Invalid video JSON: {}", e)))?;

    if video.formats.is_empty() {
        return Err(SourceError::Parse("No formats array in JSON".to_string()));
    }

    Ok(ResolvedItem {
        id: video.id.unwrap_or_else(|| item_id.to_string()),
        title: video.title.unwrap_or_else(|| "Unknown".to_string()),
        encodings: video.formats.into_iter().filter_map(to_descriptor).collect(),
    })
}

fn codec_present(codec: &Option<String>) -> bool {
    codec.as_deref().is_some_and(|c| c != "none" && !c.is_empty())
}

/// Map a yt-dlp format onto a descriptor. Manifest-based formats and formats
/// with neither audio nor video (storyboards) are dropped.
fn to_descriptor(format: FormatJson) -> Option<EncodingDescriptor> {
    let url = format.url?;
    if !matches!(format.protocol.as_deref(), None | Some("http") | Some("https")) {
        return None;
    }

    // A missing vcodec means "unknown", an explicit "none" means audio-only
    let video_absent = format.vcodec.as_deref() == Some("none");
    let has_audio = codec_present(&format.acodec);
    if video_absent && !has_audio {
        return None;
    }

    let ext = format.ext.unwrap_or_default();
    let (kind, container) = if video_absent {
        let container = match ext.as_str() {
            "m4a" => "mp4",
            "weba" => "webm",
            other => other,
        };
        ("audio", container.to_string())
    } else {
        let container = match ext.as_str() {
            "3gp" => "3gpp",
            other => other,
        };
        ("video", container.to_string())
    };

    let codecs: Vec<&str> = [&format.vcodec, &format.acodec]
        .into_iter()
        .filter(|c| codec_present(c))
        .filter_map(|c| c.as_deref())
        .collect();
    let mime_type = if codecs.is_empty() {
        format!("{}/{}", kind, container)
    } else {
        format!("{}/{}; codecs=\"{}\"", kind, container, codecs.join(", "))
    };

    // Older yt-dlp releases omit audio_channels
    let audio_channels = format.audio_channels.unwrap_or(u32::from(has_audio));

    Some(EncodingDescriptor {
        format_id: format.format_id.unwrap_or_default(),
        mime_type,
        quality: quality_label(video_absent, format.height),
        audio_channels,
        url,
        http_headers: format.http_headers,
    })
}

/// YouTube-style quality label from the video height; audio-only is "tiny"
fn quality_label(audio_only: bool, height: Option<u32>) -> String {
    match (audio_only, height) {
        (true, _) | (false, None) => LOWEST_QUALITY.to_string(),
        (false, Some(h)) if h <= 144 => LOWEST_QUALITY.to_string(),
        (false, Some(h)) if h <= 240 => "small".to_string(),
        (false, Some(h)) if h <= 360 => "medium".to_string(),
        (false, Some(h)) if h <= 480 => "large".to_string(),
        (false, Some(h)) => format!("hd{}", h),
    }
}

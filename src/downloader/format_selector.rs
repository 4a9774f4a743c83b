// FormatSelector - picks the one encoding to fetch for an item
//
// Audio: first audio-only encoding, otherwise the first encoding that carries
// audio channels at all (a muxed video). The second pass only runs once the
// first one came up empty.
//
// Video: the first video encoding is kept until a later video encoding that
// is not "tiny" shows up, so the last non-tiny one wins.

use super::models::{DownloadType, EncodingDescriptor};

/// Format selector over an item's encodings, in source order
pub struct FormatSelector;

impl FormatSelector {
    /// Select the encoding to download for `download_type`, or `None` when
    /// the item has nothing suitable.
    pub fn select(
        encodings: &[EncodingDescriptor],
        download_type: DownloadType,
    ) -> Option<&EncodingDescriptor> {
        match download_type {
            DownloadType::Audio => Self::select_audio(encodings),
            DownloadType::Video => Self::select_video(encodings),
        }
    }

    fn select_audio(encodings: &[EncodingDescriptor]) -> Option<&EncodingDescriptor> {
        // Audio-only formats first
        if let Some(audio) = encodings.iter().find(|e| e.is_audio_only()) {
            return Some(audio);
        }

        // Fallback to any format with audio
        encodings.iter().find(|e| e.has_audio())
    }

    fn select_video(encodings: &[EncodingDescriptor]) -> Option<&EncodingDescriptor> {
        let mut best: Option<&EncodingDescriptor> = None;

        for encoding in encodings.iter().filter(|e| e.is_video()) {
            if best.is_none() || !encoding.is_lowest_quality() {
                best = Some(encoding);
            }
        }

        best
    }

    /// File extension (with the dot) for a selected encoding.
    ///
    /// Audio downloads are always named `.mp3`; the stream is written as-is,
    /// so the container is whatever the source served.
    pub fn file_extension(encoding: &EncodingDescriptor, download_type: DownloadType) -> &'static str {
        if download_type == DownloadType::Audio {
            return ".mp3";
        }

        if encoding.mime_type.contains("mp4") {
            ".mp4"
        } else if encoding.mime_type.contains("webm") {
            ".webm"
        } else {
            ".mp4"
        }
    }
}

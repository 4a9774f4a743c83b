// Media sources - concrete MediaSource implementations
//
// yt-dlp resolves playlists and videos to JSON metadata; the selected format
// is then streamed straight from its URL.

mod ytdlp;

pub use ytdlp::{playlist_url, video_url, YtDlpSource};

// Command-line interface: argument parsing, config building, logging setup

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::warn;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::downloader::models::DEFAULT_PARALLEL;
use crate::downloader::{DownloadConfig, DownloadType, NetworkConfig, RunError};

#[derive(Parser, Debug)]
#[command(name = "playlist-downloader")]
#[command(version)]
#[command(about = "YouTube Playlist Downloader", long_about = None)]
#[command(arg_required_else_help = true)]
#[command(after_help = "Examples:
  playlist-downloader https://youtube.com/playlist?list=PL...
  playlist-downloader https://youtube.com/playlist?list=PL... -o ./music -t audio
  playlist-downloader https://youtube.com/playlist?list=PL... -p 5 -t video")]
pub struct Args {
    /// Playlist URL or playlist ID
    pub playlist: String,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "./downloads", overrides_with = "output")]
    pub output: PathBuf,

    /// Download type: audio or video
    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        default_value = "video",
        overrides_with = "download_type"
    )]
    pub download_type: String,

    /// Number of parallel downloads (default: 3); non-numeric values are ignored
    #[arg(short, long, value_name = "N", action = ArgAction::Append, allow_hyphen_values = true)]
    pub parallel: Vec<String>,

    /// Proxy for metadata and media requests (http://, socks5://)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Socket timeout passed to yt-dlp, in seconds
    #[arg(long, value_name = "SECS")]
    pub socket_timeout: Option<u32>,

    /// Path to the yt-dlp executable
    #[arg(long = "ytdlp", value_name = "PATH", env = "YTDLP_PATH")]
    pub ytdlp_path: Option<String>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Validate the arguments into the run configuration
    pub fn build_configs(&self) -> Result<(DownloadConfig, NetworkConfig), RunError> {
        let download_type: DownloadType = self
            .download_type
            .parse()
            .map_err(RunError::Config)?;

        let requested = resolve_parallel(&self.parallel);
        let parallel = usize::try_from(requested)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                RunError::Config(format!(
                    "Parallel downloads must be a positive number, got {}",
                    requested
                ))
            })?;

        let download = DownloadConfig::default()
            .with_output_dir(self.output.clone())
            .with_download_type(download_type)
            .with_parallel(parallel);

        let network = NetworkConfig::default()
            .with_proxy(self.proxy.clone())
            .with_socket_timeout(self.socket_timeout);

        Ok((download, network))
    }
}

/// Last valid `-p` value wins; a value that is not an integer is skipped
/// and the previous one is kept. Starts from the default of 3.
pub fn resolve_parallel(values: &[String]) -> i64 {
    let default = i64::try_from(DEFAULT_PARALLEL.get()).unwrap_or(i64::MAX);
    values.iter().fold(default, |current, raw| {
        match raw.trim().parse::<i64>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(value = %raw, kept = current, "ignoring non-numeric --parallel value");
                current
            }
        }
    })
}

/// Install the global tracing subscriber. Logs go to stderr.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("playlist-downloader").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["PL123"]).unwrap();
        let (download, network) = args.build_configs().unwrap();

        assert_eq!(args.playlist, "PL123");
        assert_eq!(download.output_dir, PathBuf::from("./downloads"));
        assert_eq!(download.download_type, DownloadType::Video);
        assert_eq!(download.parallel.get(), 3);
        assert!(network.proxy.is_none());
    }

    #[test]
    fn test_options() {
        let args = parse(&[
            "https://youtube.com/playlist?list=PL1",
            "-o",
            "./music",
            "--type",
            "audio",
            "-p",
            "5",
            "--proxy",
            "socks5://127.0.0.1:1080",
        ])
        .unwrap();
        let (download, network) = args.build_configs().unwrap();

        assert_eq!(download.output_dir, PathBuf::from("./music"));
        assert_eq!(download.download_type, DownloadType::Audio);
        assert_eq!(download.parallel.get(), 5);
        assert_eq!(network.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
    }

    #[test]
    fn test_missing_playlist_is_an_error() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);

        let err = parse(&["-t", "audio"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_invalid_type_is_config_error() {
        let args = parse(&["PL123", "-t", "mp3"]).unwrap();
        let err = args.build_configs().unwrap_err();

        assert!(matches!(err, RunError::Config(_)));
        assert_eq!(err.to_string(), "Download type must be 'audio' or 'video'");
    }

    #[test]
    fn test_non_numeric_parallel_keeps_previous_value() {
        assert_eq!(resolve_parallel(&[]), 3);
        assert_eq!(resolve_parallel(&["abc".to_string()]), 3);
        assert_eq!(resolve_parallel(&["7".to_string(), "x".to_string()]), 7);
        assert_eq!(resolve_parallel(&["x".to_string(), "2".to_string()]), 2);

        let args = parse(&["PL123", "-p", "lots"]).unwrap();
        assert_eq!(args.build_configs().unwrap().0.parallel.get(), 3);
    }

    #[test]
    fn test_non_positive_parallel_is_config_error() {
        let args = parse(&["PL123", "-p", "0"]).unwrap();
        assert!(matches!(args.build_configs(), Err(RunError::Config(_))));

        let args = parse(&["PL123", "-p", "-2"]).unwrap();
        assert!(matches!(args.build_configs(), Err(RunError::Config(_))));
    }

    #[test]
    fn test_repeated_options_last_wins() {
        let args = parse(&["PL123", "-t", "audio", "-t", "video", "-o", "a", "-o", "b"]).unwrap();
        let (download, _) = args.build_configs().unwrap();

        assert_eq!(download.download_type, DownloadType::Video);
        assert_eq!(download.output_dir, PathBuf::from("b"));
    }
}

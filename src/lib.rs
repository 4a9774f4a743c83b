mod cli;
pub mod downloader;

use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;

pub use cli::{resolve_parallel, Args};
use downloader::{
    ConsoleEmitter, MediaSource, NetworkConfig, PlaylistDownloader, PlaylistRef, SourceError,
    YtDlpSource,
};

/// Entry point of the command-line tool.
///
/// Exit status is 0 whenever the run completes, even if some items failed.
pub async fn run() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    cli::init_logging(args.verbose, args.quiet);

    let ytdlp_path = args.ytdlp_path.clone();
    run_with(args, move |network| {
        let source = YtDlpSource::new(ytdlp_path, network)?;
        Ok(Arc::new(source) as Arc<dyn MediaSource>)
    })
    .await
}

/// Run parsed arguments against the media source built by `make_source`.
///
/// The source is only built once the arguments validated.
pub async fn run_with<F>(args: Args, make_source: F) -> ExitCode
where
    F: FnOnce(NetworkConfig) -> Result<Arc<dyn MediaSource>, SourceError>,
{
    let (config, network) = match args.build_configs() {
        Ok(configs) => configs,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    let source = match make_source(network) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    println!("Starting download with configuration:");
    println!("  Output directory: {}", config.output_dir.display());
    println!("  Download type: {}", config.download_type);
    println!("  Parallel downloads: {}", config.parallel);
    println!();

    let downloader = PlaylistDownloader::new(source, config, Arc::new(ConsoleEmitter));

    match downloader.run(&PlaylistRef::new(args.playlist)).await {
        Ok(summary) => {
            println!("\n{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::{
        ByteStream, EncodingDescriptor, Playlist, PlaylistItem, ResolvedItem,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Two-item playlist; the second item's stream cannot be opened
    struct HalfBrokenSource {
        playlist_missing: bool,
    }

    #[async_trait]
    impl MediaSource for HalfBrokenSource {
        fn name(&self) -> &'static str {
            "half-broken"
        }

        async fn resolve_playlist(&self, _playlist: &PlaylistRef) -> Result<Playlist, SourceError> {
            if self.playlist_missing {
                return Err(SourceError::Execution("ERROR: playlist does not exist".to_string()));
            }
            Ok(Playlist {
                title: "Mix".to_string(),
                items: vec![
                    PlaylistItem {
                        id: "good".to_string(),
                        title: "Good".to_string(),
                        position: 1,
                    },
                    PlaylistItem {
                        id: "bad".to_string(),
                        title: "Bad".to_string(),
                        position: 2,
                    },
                ],
            })
        }

        async fn resolve_item(&self, item_id: &str) -> Result<ResolvedItem, SourceError> {
            Ok(ResolvedItem {
                id: item_id.to_string(),
                title: item_id.to_string(),
                encodings: vec![EncodingDescriptor {
                    format_id: "18".to_string(),
                    mime_type: "video/mp4".to_string(),
                    quality: "medium".to_string(),
                    audio_channels: 2,
                    url: String::new(),
                    http_headers: HashMap::new(),
                }],
            })
        }

        async fn open_stream(
            &self,
            item: &ResolvedItem,
            _encoding: &EncodingDescriptor,
        ) -> Result<ByteStream, SourceError> {
            if item.id == "bad" {
                return Err(SourceError::Execution("HTTP Error 403: Forbidden".to_string()));
            }
            Ok(futures::stream::iter(vec![Ok(Bytes::from_static(b"data"))]).boxed())
        }
    }

    fn args(extra: &[&str], out: &std::path::Path) -> Args {
        let out = out.to_string_lossy().into_owned();
        let argv = ["playlist-downloader", "PLmix", "-o", out.as_str()]
            .into_iter()
            .chain(extra.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    fn source(playlist_missing: bool) -> Arc<dyn MediaSource> {
        Arc::new(HalfBrokenSource { playlist_missing })
    }

    #[tokio::test]
    async fn test_item_failure_still_exits_zero() {
        let dir = tempfile::tempdir().unwrap();

        let code = run_with(args(&["-p", "1"], dir.path()), |_| Ok(source(false))).await;

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(dir.path().join("good.mp4").exists());
        assert!(!dir.path().join("bad.mp4").exists());
    }

    #[tokio::test]
    async fn test_playlist_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();

        let code = run_with(args(&[], dir.path()), |_| Ok(source(true))).await;

        assert_eq!(code, ExitCode::from(1));
    }

    #[tokio::test]
    async fn test_invalid_config_exits_one_before_building_source() {
        let dir = tempfile::tempdir().unwrap();

        for extra in [&["-t", "mp3"][..], &["-p", "0"][..]] {
            let built = AtomicBool::new(false);
            let code = run_with(args(extra, dir.path()), |_| {
                built.store(true, Ordering::SeqCst);
                Ok(source(false))
            })
            .await;

            assert_eq!(code, ExitCode::from(1), "args: {:?}", extra);
            assert!(!built.load(Ordering::SeqCst));
        }
    }

    #[tokio::test]
    async fn test_source_construction_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();

        let code = run_with(args(&[], dir.path()), |_| {
            Err(SourceError::ToolNotFound("yt-dlp".to_string()))
        })
        .await;

        assert_eq!(code, ExitCode::from(1));
    }

    #[tokio::test]
    async fn test_network_options_reach_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let extra = ["--proxy", "http://127.0.0.1:3128", "--socket-timeout", "9"];
        let mut seen = None;

        let code = run_with(args(&extra, dir.path()), |network| {
            seen = Some(network);
            Ok(source(true))
        })
        .await;

        assert_eq!(code, ExitCode::from(1));
        let network = seen.unwrap();
        assert_eq!(network.proxy.as_deref(), Some("http://127.0.0.1:3128"));
        assert_eq!(network.socket_timeout, Some(9));
    }
}

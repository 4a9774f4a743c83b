use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    playlist_downloader_lib::run().await
}

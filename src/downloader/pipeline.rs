// Item pipeline - metadata, format selection, stream, file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::models::DownloadConfig;
use super::paths::PathRegistry;
use super::traits::{ByteStream, MediaSource};
use super::utils::sanitize_file_name;

/// Downloads single items. Cheap to clone; clones share the source, the
/// config and the path registry.
#[derive(Clone)]
pub struct ItemPipeline {
    source: Arc<dyn MediaSource>,
    config: Arc<DownloadConfig>,
    paths: Arc<PathRegistry>,
}

impl ItemPipeline {
    pub fn new(
        source: Arc<dyn MediaSource>,
        config: Arc<DownloadConfig>,
        paths: Arc<PathRegistry>,
    ) -> Self {
        Self {
            source,
            config,
            paths,
        }
    }

    /// Download one item into the output directory and return the written path.
    ///
    /// The stream and the file are closed before this returns, whatever the
    /// outcome. A file that failed halfway is left on disk.
    pub async fn download_one(&self, item_id: &str) -> Result<PathBuf, DownloadError> {
        let item = self
            .source
            .resolve_item(item_id)
            .await
            .map_err(DownloadError::MetadataFetch)?;

        let download_type = self.config.download_type;
        let encoding = FormatSelector::select(&item.encodings, download_type)
            .ok_or(DownloadError::NoSuitableFormat { download_type })?;

        debug!(
            item = item_id,
            format = %encoding.format_id,
            mime = %encoding.mime_type,
            quality = %encoding.quality,
            "selected format"
        );

        let file_name = format!(
            "{}{}",
            sanitize_file_name(&item.title),
            FormatSelector::file_extension(encoding, download_type)
        );
        let path = self
            .paths
            .claim(self.config.output_dir.join(file_name), item_id);

        let stream = self
            .source
            .open_stream(&item, encoding)
            .await
            .map_err(DownloadError::StreamOpen)?;

        let written = save_stream(stream, &path)
            .await
            .map_err(|source| DownloadError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(item = item_id, path = %path.display(), bytes = written, "saved");
        Ok(path)
    }
}

/// Copy the whole stream into a freshly created (or truncated) file.
///
/// The file is flushed before returning on every path, so whatever was
/// written is on disk once this returns, even when the stream broke.
async fn save_stream(mut stream: ByteStream, path: &Path) -> std::io::Result<u64> {
    let mut file = File::create(path).await?;
    let mut written: u64 = 0;

    let copied = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok::<(), std::io::Error>(())
    }
    .await;

    let flushed = file.flush().await;
    copied?;
    flushed?;
    Ok(written)
}

// Orchestrator - fans a playlist out over a bounded pool of download tasks

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::{Id as TaskId, JoinSet};
use tracing::{debug, error, info};

use super::errors::RunError;
use super::models::{DownloadConfig, DownloadOutcome, PlaylistItem, PlaylistRef, RunSummary};
use super::paths::PathRegistry;
use super::pipeline::ItemPipeline;
use super::traits::{DownloadEvent, MediaSource, ProgressEmitter};

pub struct PlaylistDownloader {
    source: Arc<dyn MediaSource>,
    config: Arc<DownloadConfig>,
    emitter: Arc<dyn ProgressEmitter>,
}

impl PlaylistDownloader {
    pub fn new(
        source: Arc<dyn MediaSource>,
        config: DownloadConfig,
        emitter: Arc<dyn ProgressEmitter>,
    ) -> Self {
        Self {
            source,
            config: Arc::new(config),
            emitter,
        }
    }

    /// Download every item of the playlist.
    ///
    /// Only playlist resolution and output directory creation fail the run.
    /// Item failures end up in the returned summary.
    pub async fn run(&self, playlist_ref: &PlaylistRef) -> Result<RunSummary, RunError> {
        self.emitter.emit(DownloadEvent::PlaylistFetching {
            reference: playlist_ref.to_string(),
        });

        let playlist = self
            .source
            .resolve_playlist(playlist_ref)
            .await
            .map_err(RunError::PlaylistResolution)?;

        info!(
            source = self.source.name(),
            title = %playlist.title,
            items = playlist.items.len(),
            "playlist resolved"
        );
        self.emitter.emit(DownloadEvent::PlaylistResolved {
            title: playlist.title.clone(),
            count: playlist.items.len(),
        });

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|source| RunError::OutputDir {
                path: self.config.output_dir.clone(),
                source,
            })?;

        let outcomes = self.download_all(playlist.items).await;
        Ok(RunSummary::from_outcomes(playlist.title, outcomes))
    }

    /// Spawn one task per item behind the admission gate and collect one
    /// outcome per item, in completion order.
    async fn download_all(&self, items: Vec<PlaylistItem>) -> Vec<DownloadOutcome> {
        let total = items.len();
        let gate = Arc::new(Semaphore::new(
            self.config.parallel.get().min(Semaphore::MAX_PERMITS),
        ));
        let pipeline = ItemPipeline::new(
            Arc::clone(&self.source),
            Arc::clone(&self.config),
            Arc::new(PathRegistry::new()),
        );

        let mut tasks = JoinSet::new();
        let mut pending: HashMap<TaskId, PlaylistItem> = HashMap::with_capacity(total);

        for item in items {
            let gate = Arc::clone(&gate);
            let pipeline = pipeline.clone();
            let emitter = Arc::clone(&self.emitter);
            let task_item = item.clone();

            let handle = tasks.spawn(async move {
                download_item(gate, pipeline, emitter, task_item, total).await
            });
            pending.insert(handle.id(), item);
        }

        // Completion barrier: every spawned task, independent of the gate
        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    pending.remove(&id);
                    outcomes.push(outcome);
                }
                Err(join_error) => {
                    let Some(item) = pending.remove(&join_error.id()) else {
                        error!("download task failed: {}", join_error);
                        continue;
                    };
                    error!(item = %item.id, "download task failed: {}", join_error);
                    self.emitter.emit(DownloadEvent::ItemFailed {
                        position: item.position,
                        total,
                        title: item.title.clone(),
                        elapsed: Default::default(),
                        error: join_error.to_string(),
                    });
                    outcomes.push(DownloadOutcome::failed(
                        &item,
                        Default::default(),
                        format!("download task failed: {}", join_error),
                    ));
                }
            }
        }

        outcomes
    }
}

async fn download_item(
    gate: Arc<Semaphore>,
    pipeline: ItemPipeline,
    emitter: Arc<dyn ProgressEmitter>,
    item: PlaylistItem,
    total: usize,
) -> DownloadOutcome {
    // Held until the end of this function, released on every path
    let _permit = match gate.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            return DownloadOutcome::failed(&item, Default::default(), e);
        }
    };

    emitter.emit(DownloadEvent::ItemStarted {
        position: item.position,
        total,
        title: item.title.clone(),
    });

    let start = Instant::now();
    let result = pipeline.download_one(&item.id).await;
    let elapsed = start.elapsed();

    match result {
        Ok(path) => {
            debug!(item = %item.id, ?elapsed, "item done");
            emitter.emit(DownloadEvent::ItemCompleted {
                position: item.position,
                total,
                title: item.title.clone(),
                elapsed,
                path: path.clone(),
            });
            DownloadOutcome::succeeded(&item, elapsed, path)
        }
        Err(e) => {
            debug!(item = %item.id, ?elapsed, error = %e, "item failed");
            emitter.emit(DownloadEvent::ItemFailed {
                position: item.position,
                total,
                title: item.title.clone(),
                elapsed,
                error: e.to_string(),
            });
            DownloadOutcome::failed(&item, elapsed, e)
        }
    }
}

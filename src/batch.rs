//! Bounded parallel processing of a song list.

use futures::{StreamExt, stream};
use std::sync::Arc;

use crate::acquire::AudioSource;
use crate::fetcher::{FetchOutcome, SongFetcher};

/// Fetch every song with at most `workers` requests in flight.
///
/// Each request runs as its own task so a slow download or a panic stays
/// confined to that song. Outcomes are returned in completion order.
pub async fn run_batch<S>(
    fetcher: Arc<SongFetcher<S>>,
    songs: Vec<String>,
    workers: usize,
) -> Vec<FetchOutcome>
where
    S: AudioSource + 'static,
{
    let workers = workers.max(1);
    tracing::info!(songs = songs.len(), workers, "Starting batch");

    stream::iter(songs)
        .map(|name| {
            let fetcher = Arc::clone(&fetcher);
            async move {
                let task_name = name.clone();
                match tokio::spawn(async move { fetcher.fetch(&task_name).await }).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(song = %name, error = %e, "Fetch task aborted");
                        FetchOutcome::failed(name, format!("task aborted: {}", e))
                    }
                }
            }
        })
        .buffer_unordered(workers)
        .collect()
        .await
}

/// Counts per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub downloaded: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FetchOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, o| {
            match o {
                FetchOutcome::Downloaded { .. } => acc.downloaded += 1,
                FetchOutcome::Copied { .. } => acc.copied += 1,
                FetchOutcome::Skipped { .. } => acc.skipped += 1,
                FetchOutcome::Failed { .. } => acc.failed += 1,
            }
            acc
        })
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Completed: {} downloaded, {} copied, {} skipped, {} failed",
            self.downloaded, self.copied, self.skipped, self.failed
        )
    }
}

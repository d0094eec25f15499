//! Fetch command: read the song list and fetch every song.

use anyhow::Context;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::Cli;
use crate::acquire::{AcquireOptions, YtDlp};
use crate::batch::{self, BatchSummary};
use crate::config::{self, Config};
use crate::fetcher::{FetchSettings, SongFetcher};
use crate::{platform, request};

/// Exit code when the song list does not exist.
pub const EXIT_INPUT_MISSING: u8 = 2;

/// Everything a run needs, resolved from CLI flags, config and platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub output_dir: PathBuf,
    pub cache_dir: Option<PathBuf>,
    pub options: AcquireOptions,
    pub workers: usize,
    pub yt_dlp: PathBuf,
    pub ffmpeg_location: Option<PathBuf>,
}

impl RunPlan {
    /// Merge CLI flags over config values. `downloads` is the detected
    /// Downloads folder, used for whatever neither source sets.
    pub fn resolve(cli: &Cli, config: &Config, downloads: &Path, today: NaiveDate) -> Self {
        let output_dir = cli.output.clone().unwrap_or_else(|| {
            let root = config.paths.output_root.as_deref().unwrap_or(downloads);
            platform::default_output_dir(root, &config.paths.output_folder_prefix, today)
        });

        let cache_dir = if cli.no_cache || !config.paths.use_cache {
            None
        } else {
            Some(
                cli.cache_dir
                    .clone()
                    .or_else(|| config.paths.cache_dir.clone())
                    .unwrap_or_else(|| downloads.to_path_buf()),
            )
        };

        let options = AcquireOptions {
            bitrate: cli.bitrate.unwrap_or_else(|| config.fetch.bitrate()),
            embed_thumbnail: config.fetch.embed_thumbnail && !cli.no_thumbnail,
        };

        Self {
            output_dir,
            cache_dir,
            options,
            workers: cli
                .workers
                .map(usize::from)
                .unwrap_or_else(|| config.fetch.workers()),
            yt_dlp: cli.yt_dlp.clone().unwrap_or_else(|| config.tools.yt_dlp.clone()),
            ffmpeg_location: config.tools.ffmpeg_location.clone(),
        }
    }
}

/// Absolute form of a path for comparisons; falls back to the path as given.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Fetch every song in the input list and print one status line per song.
///
/// Returns the process exit code; per-song failures do not change it.
pub fn cmd_fetch(cli: &Cli) -> anyhow::Result<u8> {
    let Some(ref input) = cli.input else {
        anyhow::bail!("No input file given");
    };

    if !input.exists() {
        eprintln!("Input file not found: {}", input.display());
        return Ok(EXIT_INPUT_MISSING);
    }

    let config = config::load(cli.config.as_deref())?;
    let plan = RunPlan::resolve(cli, &config, &platform::downloads_dir(), platform::today());

    std::fs::create_dir_all(&plan.output_dir)
        .with_context(|| format!("Failed to create output folder {:?}", plan.output_dir))?;
    let output_dir = canonical(&plan.output_dir);
    let cache_dir = plan.cache_dir.as_deref().map(canonical);

    let songs = request::read_song_list(input)
        .with_context(|| format!("Failed to read song list {:?}", input))?;

    info!(
        songs = songs.len(),
        output = %output_dir.display(),
        cache = ?cache_dir,
        bitrate = %plan.options.bitrate,
        "Fetching songs"
    );

    let source = YtDlp::new(plan.yt_dlp.clone()).with_ffmpeg_location(plan.ffmpeg_location.clone());
    let fetcher = Arc::new(SongFetcher::new(
        source,
        FetchSettings {
            output_dir,
            cache_dir,
            options: plan.options.clone(),
        },
    ));

    let rt = Runtime::new()?;
    let outcomes = rt.block_on(async {
        match fetcher.source().version().await {
            Some(version) => info!("Using yt-dlp {}", version),
            None => warn!(
                "{} not found; songs not in the output or cache folder will fail",
                fetcher.source().program().display()
            ),
        }
        batch::run_batch(Arc::clone(&fetcher), songs, plan.workers).await
    });

    for outcome in &outcomes {
        println!("{}", outcome);
    }
    println!("\n{}", BatchSummary::from_outcomes(&outcomes));

    Ok(0)
}

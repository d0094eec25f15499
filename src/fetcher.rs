//! Per-song fetch flow: skip, copy from cache, or download.
//!
//! For each song name the fetcher tries, in order:
//! 1. The output file already exists - nothing to do
//! 2. A matching MP3 exists in the cache directory - copy it
//! 3. Ask the [`AudioSource`] to find and download it, then tag it
//!
//! Every failure stays inside its own [`FetchOutcome`]; nothing here returns
//! an error to the caller.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::acquire::{AcquireOptions, AudioSource};
use crate::error::Error;
use crate::{cache, metadata, organizer};

/// Name prefix of the per-request folders downloads land in before the move.
const STAGING_PREFIX: &str = ".song-fetch-";

/// Where and how songs are fetched.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Final location of every `<name>.mp3`
    pub output_dir: PathBuf,
    /// Searched for existing copies before downloading; `None` disables it
    pub cache_dir: Option<PathBuf>,
    /// Passed through to the audio source
    pub options: AcquireOptions,
}

/// What happened to a single song request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Output already existed
    Skipped { path: PathBuf },
    /// Copied from the cache directory
    Copied { from: PathBuf, to: PathBuf },
    /// Downloaded by the audio source
    Downloaded { path: PathBuf },
    /// Copy or download failed
    Failed { name: String, message: String },
}

impl FetchOutcome {
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { path } => write!(f, "skipped (exists): {}", path.display()),
            Self::Copied { from, to } => {
                write!(f, "copied from cache: {} -> {}", file_name(from), file_name(to))
            }
            Self::Downloaded { path } => write!(f, "downloaded: {}", file_name(path)),
            Self::Failed { name, message } => write!(f, "error: {} -> {}", name, message),
        }
    }
}

/// Fetches songs into the output directory using an [`AudioSource`].
pub struct SongFetcher<S> {
    source: S,
    settings: FetchSettings,
}

impl<S: AudioSource> SongFetcher<S> {
    pub fn new(source: S, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch one song. Never fails; problems become [`FetchOutcome::Failed`].
    pub async fn fetch(&self, name: &str) -> FetchOutcome {
        let out_path = organizer::output_path(&self.settings.output_dir, name);

        if out_path.exists() {
            debug!(song = name, path = %out_path.display(), "Output exists");
            return FetchOutcome::Skipped { path: out_path };
        }

        if let Some(ref cache_dir) = self.settings.cache_dir {
            let found = cache::find_match(
                cache_dir.clone(),
                name.to_string(),
                Some(self.settings.output_dir.clone()),
            )
            .await;

            if let Some(cached) = found {
                return self.copy_from_cache(name, cached, out_path).await;
            }
        }

        self.download(name, out_path).await
    }

    async fn copy_from_cache(&self, name: &str, cached: PathBuf, out_path: PathBuf) -> FetchOutcome {
        info!(song = name, source = %cached.display(), "Copying from cache");

        let (from, to) = (cached.clone(), out_path.clone());
        let copied = tokio::task::spawn_blocking(move || organizer::copy_no_clobber(&from, &to))
            .await
            .map_err(Error::from)
            .and_then(|r| r);

        match copied {
            Ok(_) => FetchOutcome::Copied {
                from: cached,
                to: out_path,
            },
            Err(Error::AlreadyExists(path)) => FetchOutcome::Skipped { path },
            Err(e) => {
                warn!(song = name, error = %e, "Cache copy failed");
                FetchOutcome::failed(name, e.to_string())
            }
        }
    }

    async fn download(&self, name: &str, out_path: PathBuf) -> FetchOutcome {
        info!(song = name, "Downloading");

        // Per-request staging folder; only files inside it are ever moved
        let staging = match tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.settings.output_dir)
        {
            Ok(dir) => dir,
            Err(e) => {
                warn!(song = name, error = %e, "Could not create staging folder");
                return FetchOutcome::failed(
                    name,
                    format!("Failed to create staging folder: {}", e),
                );
            }
        };

        let audio = match self
            .source
            .fetch_audio(name, staging.path(), &self.settings.options)
            .await
        {
            Ok(audio) => audio,
            Err(e) => {
                warn!(song = name, error = %e, "Download failed");
                return FetchOutcome::failed(name, e.to_string());
            }
        };

        let Some(produced) = resolve_produced(&audio.path, staging.path()) else {
            warn!(song = name, reported = %audio.path.display(), "No mp3 produced");
            return FetchOutcome::failed(name, format!("no mp3 produced for {}", name));
        };

        let title = audio.title.unwrap_or_else(|| name.to_string());
        let to = out_path.clone();
        let placed = tokio::task::spawn_blocking(move || {
            organizer::move_no_clobber(&produced, &to)?;
            if let Err(e) = metadata::write_title(&to, &title) {
                debug!(error = %e, "Could not set title tag");
            }
            Ok::<_, Error>(())
        })
        .await
        .map_err(Error::from)
        .and_then(|r| r);

        if let Err(e) = staging.close() {
            debug!(error = %e, "Could not remove staging folder");
        }

        match placed {
            Ok(()) => FetchOutcome::Downloaded { path: out_path },
            // Another request for the same name won the race
            Err(Error::AlreadyExists(path)) => FetchOutcome::Skipped { path },
            Err(e) => {
                warn!(song = name, error = %e, "Could not move download into place");
                FetchOutcome::failed(name, e.to_string())
            }
        }
    }
}

/// The file the tool reported, or the same stem with an `.mp3` extension
/// when it reported the pre-transcode name. Only files inside `staging`
/// are accepted.
fn resolve_produced(reported: &Path, staging: &Path) -> Option<PathBuf> {
    if !reported.starts_with(staging) {
        return None;
    }
    if reported.is_file() {
        return Some(reported.to_path_buf());
    }
    let mp3 = reported.with_extension("mp3");
    mp3.is_file().then_some(mp3)
}

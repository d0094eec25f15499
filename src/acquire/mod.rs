//! Audio acquisition - searching an online service and fetching a transcoded file.
//!
//! The fetcher only depends on the [`AudioSource`] trait. Production code uses
//! [`YtDlp`], which shells out to the `yt-dlp` command-line tool (and through it
//! `ffmpeg`). Tests substitute [`mocks::MockAudioSource`].
//!
//! # Usage
//!
//! ```ignore
//! use song_fetch::acquire::{AcquireOptions, AudioSource, YtDlp};
//!
//! let source = YtDlp::default();
//! let audio = source
//!     .fetch_audio("Daft Punk One More Time", out_dir, &AcquireOptions::default())
//!     .await?;
//! println!("saved {:?}", audio.path);
//! ```

pub mod ytdlp;

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use ytdlp::YtDlp;

/// Target bitrate for the transcoded MP3, in kbit/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitrate(u32);

impl Bitrate {
    pub const DEFAULT: Bitrate = Bitrate(192);

    pub fn new(kbps: u32) -> Option<Self> {
        (kbps > 0).then_some(Self(kbps))
    }

    pub fn kbps(self) -> u32 {
        self.0
    }
}

impl Default for Bitrate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}k", self.0)
    }
}

impl FromStr for Bitrate {
    type Err = String;

    /// Accepts `192k`, `192K` or `192`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_suffix(['k', 'K'])
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Bitrate::new)
            .ok_or_else(|| format!("invalid bitrate '{}', expected e.g. 192k", s))
    }
}

/// Options passed to the acquisition tool for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireOptions {
    /// MP3 bitrate to transcode to
    pub bitrate: Bitrate,
    /// Embed the video thumbnail as cover art when one is available
    pub embed_thumbnail: bool,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            bitrate: Bitrate::DEFAULT,
            embed_thumbnail: true,
        }
    }
}

/// A file produced by the acquisition tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredAudio {
    /// Where the tool says it saved the file
    pub path: PathBuf,
    /// Title of the matched source, if the tool reported one
    pub title: Option<String>,
}

/// Errors that can occur while acquiring audio
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("{0} not found. Install yt-dlp: https://github.com/yt-dlp/yt-dlp")]
    ToolNotFound(PathBuf),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("yt-dlp failed ({status}): {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("No search results")]
    NoResults,

    #[error("Failed to parse yt-dlp output: {0}")]
    Parse(String),
}

/// Capability to search for a song and save it as audio.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Search for `query`, download the best match into `dest_dir` and
    /// transcode it according to `options`.
    async fn fetch_audio(
        &self,
        query: &str,
        dest_dir: &Path,
        options: &AcquireOptions,
    ) -> Result<AcquiredAudio, AcquireError>;
}

/// Mock audio source for testing.
///
/// Writes a small fake MP3 into the destination directory and records every
/// call, including how many calls were in flight at once.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub struct MockAudioSource {
        /// Queries that fail with `NoResults`
        pub failing: HashSet<String>,
        /// Queries that report a file but never write it
        pub missing_output: HashSet<String>,
        /// Title reported back to the caller (defaults to the query)
        pub reported_title: Option<String>,
        /// Path reported back instead of writing a file into `dest_dir`
        pub reported_path: Option<PathBuf>,
        /// Simulated download time
        pub delay: Duration,
        calls: Mutex<Vec<String>>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Default for MockAudioSource {
        fn default() -> Self {
            Self {
                failing: HashSet::new(),
                missing_output: HashSet::new(),
                reported_title: None,
                reported_path: None,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl MockAudioSource {
        /// Create a mock that succeeds for every query.
        pub fn succeeding() -> Self {
            Self::default()
        }

        /// Create a mock that fails for the given queries.
        pub fn failing_for(queries: &[&str]) -> Self {
            Self {
                failing: queries.iter().map(|q| q.to_string()).collect(),
                ..Self::default()
            }
        }

        /// Create a mock whose downloads take `delay`.
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Highest number of simultaneously active `fetch_audio` calls.
        pub fn peak_concurrency(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioSource for MockAudioSource {
        async fn fetch_audio(
            &self,
            query: &str,
            dest_dir: &Path,
            _options: &AcquireOptions,
        ) -> Result<AcquiredAudio, AcquireError> {
            self.calls.lock().unwrap().push(query.to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let result = if self.failing.contains(query) {
                Err(AcquireError::NoResults)
            } else if let Some(ref path) = self.reported_path {
                Ok(AcquiredAudio {
                    path: path.clone(),
                    title: self.reported_title.clone(),
                })
            } else {
                let path = dest_dir.join(format!("{} [source].mp3", query));
                if !self.missing_output.contains(query) {
                    std::fs::write(&path, b"ID3fake-audio").unwrap();
                }
                Ok(AcquiredAudio {
                    path,
                    title: Some(
                        self.reported_title
                            .clone()
                            .unwrap_or_else(|| query.to_string()),
                    ),
                })
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

//! Test utilities and fixtures for song-fetch tests.
//!
//! # Example
//!
//! ```ignore
//! use song_fetch::test_utils::Fixture;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let fx = Fixture::new();
//!     let fetcher = fx.fetcher(MockAudioSource::succeeding());
//!     // ... test logic
//! }
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::acquire::mocks::MockAudioSource;
use crate::acquire::AcquireOptions;
use crate::fetcher::{FetchSettings, SongFetcher};

/// Temporary directory laid out like a real run: a Downloads-style cache
/// directory with the dated output folder inside it.
///
/// Everything is deleted when the fixture is dropped.
pub struct Fixture {
    _dir: TempDir,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let cache_dir = dir.path().join("Downloads");
        let output_dir = cache_dir.join("songs converted 2026-10-19");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");

        Self {
            _dir: dir,
            cache_dir,
            output_dir,
        }
    }

    /// Settings pointing at this fixture's directories with default options.
    pub fn settings(&self) -> FetchSettings {
        FetchSettings {
            output_dir: self.output_dir.clone(),
            cache_dir: Some(self.cache_dir.clone()),
            options: AcquireOptions::default(),
        }
    }

    pub fn fetcher(&self, source: MockAudioSource) -> SongFetcher<MockAudioSource> {
        SongFetcher::new(source, self.settings())
    }

    /// Names of the files currently in the output directory, sorted.
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output_dir)
            .expect("Failed to read output directory")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Create an empty file, including missing parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::File::create(path).expect("Failed to create file");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layout() {
        let fx = Fixture::new();
        assert!(fx.cache_dir.is_dir());
        assert!(fx.output_dir.is_dir());
        assert!(fx.output_dir.starts_with(&fx.cache_dir));
        assert!(fx.output_files().is_empty());
    }

    #[test]
    fn test_touch_creates_parents() {
        let fx = Fixture::new();
        let path = fx.cache_dir.join("a").join("b").join("song.mp3");
        touch(&path);
        assert!(path.is_file());
    }
}

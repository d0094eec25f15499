//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\song-fetch\config.toml
//! - macOS: ~/Library/Application Support/song-fetch/config.toml
//! - Linux: ~/.config/song-fetch/config.toml
//!
//! The file is optional and every field has a default. Command-line flags
//! override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::acquire::Bitrate;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Download behaviour
    pub fetch: FetchConfig,

    /// Cache and output locations
    pub paths: PathsConfig,

    /// External tool locations
    pub tools: ToolsConfig,
}

/// Download behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of songs fetched in parallel
    pub workers: usize,

    /// MP3 bitrate, e.g. "192k"
    pub bitrate: String,

    /// Embed the video thumbnail as cover art
    pub embed_thumbnail: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            bitrate: Bitrate::DEFAULT.to_string(),
            embed_thumbnail: true,
        }
    }
}

impl FetchConfig {
    /// Worker count, never below one.
    pub fn workers(&self) -> usize {
        if self.workers == 0 {
            tracing::warn!("Configured workers = 0, using 1");
        }
        self.workers.max(1)
    }

    /// Parsed bitrate, falling back to the default when the value is invalid.
    pub fn bitrate(&self) -> Bitrate {
        self.bitrate.parse().unwrap_or_else(|e| {
            tracing::warn!("{}, using {}", e, Bitrate::DEFAULT);
            Bitrate::DEFAULT
        })
    }
}

/// Cache and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory searched for already downloaded songs (default: Downloads)
    pub cache_dir: Option<PathBuf>,

    /// Whether to search the cache directory at all
    pub use_cache: bool,

    /// Parent of the dated output folder (default: Downloads)
    pub output_root: Option<PathBuf>,

    /// Name prefix of the dated output folder
    pub output_folder_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            use_cache: true,
            output_root: None,
            output_folder_prefix: "songs converted".to_string(),
        }
    }
}

/// External tool locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable
    pub yt_dlp: PathBuf,

    /// ffmpeg binary or directory handed to yt-dlp
    pub ffmpeg_location: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg_location: None,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("song-fetch"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration.
///
/// An explicitly given file must exist and parse. Without one, the default
/// location is tried and any problem there falls back to defaults with a
/// logged warning - we always return a usable config.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        let config = read_file(path)?;
        tracing::info!("Loaded config from {:?}", path);
        return Ok(config);
    }

    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Ok(Config::default());
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    match read_file(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            Ok(config)
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Ok(Config::default())
        }
    }
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

// ============================================================================
// Tests
// ============================================================================

//! Platform-specific utilities for detecting user folders.
//!
//! Resolved once at startup; the fetcher receives plain paths.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Where WSL mounts the Windows user profiles.
const WSL_USERS_ROOT: &str = "/mnt/c/Users";

/// Windows profiles that never belong to a real user.
const SHARED_PROFILES: &[&str] = &["Public", "Default", "Default User", "All Users"];

/// Get the user's Downloads folder, with fallbacks for various OS configurations.
///
/// Checks in order:
/// 1. Windows Downloads folder when running under WSL
/// 2. System download directory (via `dirs` crate)
/// 3. `Downloads` under the home directory
/// 4. Current directory (last resort)
pub fn downloads_dir() -> PathBuf {
    if let Some(downloads) = wsl_downloads_in(Path::new(WSL_USERS_ROOT)) {
        return downloads;
    }

    if let Some(downloads) = dirs::download_dir() {
        if downloads.exists() {
            return downloads;
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join("Downloads");
    }

    std::env::current_dir().unwrap_or_default()
}

/// First `<users_root>/<user>/Downloads` that exists, skipping shared profiles.
///
/// Profiles are checked in name order so the result is stable across runs.
pub fn wsl_downloads_in(users_root: &Path) -> Option<PathBuf> {
    let mut profiles: Vec<PathBuf> = std::fs::read_dir(users_root)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            !SHARED_PROFILES.iter().any(|s| name == *s)
        })
        .map(|e| e.path())
        .collect();
    profiles.sort();

    profiles
        .into_iter()
        .map(|p| p.join("Downloads"))
        .find(|d| d.is_dir())
}

/// Dated default output folder, e.g. `<root>/songs converted 2026-10-19`.
pub fn default_output_dir(root: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    root.join(format!("{} {}", prefix, date.format("%Y-%m-%d")))
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

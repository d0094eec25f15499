//! Song list input.

use std::path::Path;

use crate::error::{Error, Result, ResultExt};

/// Parse a song list: one name per line, surrounding whitespace trimmed,
/// blank lines skipped. Duplicates are kept.
pub fn parse_song_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a UTF-8 song list file.
pub fn read_song_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let contents = std::fs::read_to_string(path)
        .with_context(format!("Failed to read song list {:?}", path))?;
    Ok(parse_song_list(&contents))
}

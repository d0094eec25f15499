//! Audio file tag writing.
//!
//! Uses the lofty crate for format-independent metadata access. Only the
//! title field is written; everything else yt-dlp or the cache file already
//! carries is left alone.

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};
use std::path::Path;

use crate::error::{Error, Result};

/// Set the title tag, creating a tag of the file's primary type if needed.
pub fn write_title(path: &Path, title: &str) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("Failed to open file for writing: {}", e)))?
        .read()
        .map_err(|e| Error::metadata(path, format!("Failed to read file for tag writing: {}", e)))?;

    let tag_type = tagged_file.primary_tag_type();

    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.tag_mut(tag_type) else {
        return Err(Error::metadata(path, "No writable tag for this format"));
    };

    tag.set_title(title.to_string());

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::metadata(path, format!("Failed to write tags to file: {}", e)))
}

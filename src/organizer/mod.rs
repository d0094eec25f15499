//! Placement of fetched songs in the output directory.
//!
//! Every song name maps to exactly one output file, `<output>/<name>.mp3`.
//! Files are copied or moved there without ever replacing an existing file,
//! so the output path doubles as the "already fetched" marker.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};

/// Deterministic output path for a song name.
pub fn output_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{}.mp3", sanitize_filename(name.trim())))
}

/// Sanitizes a filename by removing/replacing invalid characters
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}

/// Copies `source` to `dest`, failing if `dest` already exists.
///
/// The destination is opened with create-new semantics so two writers
/// racing on the same name cannot clobber each other. A partially written
/// destination is removed on failure.
pub fn copy_no_clobber(source: &Path, dest: &Path) -> Result<u64> {
    let mut reader =
        File::open(source).with_context(format!("Failed to open {:?}", source))?;

    let mut writer = match OpenOptions::new().write(true).create_new(true).open(dest) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(dest.to_path_buf()));
        }
        Err(e) => return Err(Error::Io(e).context(format!("Failed to create {:?}", dest))),
    };

    match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            drop(writer);
            let _ = fs::remove_file(dest);
            Err(Error::Io(e).context(format!("Failed to copy {:?} to {:?}", source, dest)))
        }
    }
}

/// Moves `source` to `dest`, failing if `dest` already exists.
pub fn move_no_clobber(source: &Path, dest: &Path) -> Result<()> {
    if source == dest {
        return Ok(());
    }

    // A hard link refuses to replace an existing file, unlike rename
    match fs::hard_link(source, dest) {
        Ok(()) => {
            fs::remove_file(source)
                .with_context(format!("Failed to remove source file: {:?}", source))?;
            return Ok(());
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(dest.to_path_buf()));
        }
        Err(e) => {
            tracing::debug!(error = %e, "Hard link unsupported, falling back to rename");
        }
    }

    if dest.exists() {
        return Err(Error::AlreadyExists(dest.to_path_buf()));
    }

    if let Err(_e) = fs::rename(source, dest) {
        // If rename fails (cross-device), try copy + delete
        copy_no_clobber(source, dest)?;
        fs::remove_file(source)
            .with_context(format!("Failed to remove source file: {:?}", source))?;
    }

    Ok(())
}

//! `yt-dlp` backed audio source.
//!
//! Shells out to the `yt-dlp` command-line tool, which searches YouTube,
//! downloads the best audio stream and hands it to `ffmpeg` for the MP3
//! transcode and thumbnail embedding.
//!
//! Install yt-dlp and ffmpeg:
//! - Windows: `winget install yt-dlp.yt-dlp Gyan.FFmpeg`
//! - macOS: `brew install yt-dlp ffmpeg`
//! - Linux: `pipx install yt-dlp` and `apt install ffmpeg`

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{AcquireError, AcquireOptions, AcquiredAudio, AudioSource};

/// Printed once per downloaded entry after the final move.
const PRINT_TEMPLATE: &str = "after_move:%(.{title,filepath})j";

/// Audio source that runs the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ffmpeg_location: None,
        }
    }

    /// Point yt-dlp at a specific ffmpeg binary or directory.
    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Get the yt-dlp version string (for diagnostics)
    pub async fn version(&self) -> Option<String> {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    }

    fn build_args(&self, query: &str, dest_dir: &Path, options: &AcquireOptions) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            "bestaudio/best".to_string(),
            "--no-playlist".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--audio-quality".to_string(),
            format!("{}K", options.bitrate.kbps()),
        ];

        if options.embed_thumbnail {
            args.push("--embed-thumbnail".to_string());
        }

        if let Some(ref ffmpeg) = self.ffmpeg_location {
            args.extend([
                "--ffmpeg-location".to_string(),
                ffmpeg.to_string_lossy().to_string(),
            ]);
        }

        args.extend([
            "--output".to_string(),
            dest_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .to_string(),
            // --print implies --simulate otherwise
            "--no-simulate".to_string(),
            "--print".to_string(),
            PRINT_TEMPLATE.to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
        ]);

        args.push(format!("ytsearch1:{}", query));
        args
    }

    fn map_spawn_error(&self, err: std::io::Error) -> AcquireError {
        if err.kind() == std::io::ErrorKind::NotFound {
            AcquireError::ToolNotFound(self.program.clone())
        } else {
            AcquireError::Spawn {
                program: self.program.clone(),
                source: err,
            }
        }
    }
}

#[async_trait]
impl AudioSource for YtDlp {
    async fn fetch_audio(
        &self,
        query: &str,
        dest_dir: &Path,
        options: &AcquireOptions,
    ) -> Result<AcquiredAudio, AcquireError> {
        let args = self.build_args(query, dest_dir, options);
        tracing::debug!(query, ?args, "Running yt-dlp");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AcquireError::ToolFailed {
                status: output
                    .status
                    .code()
                    .map(|c| format!("exit code {}", c))
                    .unwrap_or_else(|| "terminated by signal".to_string()),
                stderr: last_error_line(&stderr),
            });
        }

        parse_print_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Fields emitted by [`PRINT_TEMPLATE`]
#[derive(Deserialize)]
struct PrintedEntry {
    title: Option<String>,
    filepath: Option<PathBuf>,
}

/// Parse the `--print` output. Only the last entry counts.
fn parse_print_output(stdout: &str) -> Result<AcquiredAudio, AcquireError> {
    let Some(line) = stdout.lines().map(str::trim).rfind(|l| !l.is_empty()) else {
        return Err(AcquireError::NoResults);
    };

    let entry: PrintedEntry = serde_json::from_str(line)
        .map_err(|e| AcquireError::Parse(format!("{}: {}", e, line)))?;

    let path = entry
        .filepath
        .ok_or_else(|| AcquireError::Parse(format!("no filepath in {}", line)))?;

    Ok(AcquiredAudio {
        path,
        title: entry.title.filter(|t| !t.trim().is_empty()),
    })
}

/// yt-dlp prefixes its fatal messages with `ERROR:`; fall back to the last line.
fn last_error_line(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or(lines.last())
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "no error output".to_string())
}

//! External tool check.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::runtime::Runtime;

use super::Cli;
use crate::acquire::YtDlp;
use crate::config;

/// Print installation instructions for yt-dlp and ffmpeg
pub(crate) fn print_install_instructions() {
    eprintln!("Install yt-dlp and ffmpeg:");
    eprintln!("  Windows: winget install yt-dlp.yt-dlp Gyan.FFmpeg");
    eprintln!("  macOS:   brew install yt-dlp ffmpeg");
    eprintln!("  Linux:   pipx install yt-dlp && apt install ffmpeg");
}

/// The ffmpeg executable for a configured location, which may be the
/// binary itself or the directory containing it.
fn ffmpeg_program(location: Option<&Path>) -> PathBuf {
    match location {
        Some(dir) if dir.is_dir() => dir.join("ffmpeg"),
        Some(bin) => bin.to_path_buf(),
        None => PathBuf::from("ffmpeg"),
    }
}

/// First line of `ffmpeg -version`, e.g. "ffmpeg version 7.1 ...".
async fn ffmpeg_version(program: &Path) -> Option<String> {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .map(|l| l.trim().to_string())
        })
}

/// Check if yt-dlp and ffmpeg are installed. Exit code 1 if either is missing.
pub fn cmd_check_tools(cli: &Cli) -> anyhow::Result<u8> {
    let config = config::load(cli.config.as_deref())?;
    let ytdlp = YtDlp::new(
        cli.yt_dlp
            .clone()
            .unwrap_or_else(|| config.tools.yt_dlp.clone()),
    );
    let ffmpeg = ffmpeg_program(config.tools.ffmpeg_location.as_deref());

    println!("Checking download tools...\n");

    let rt = Runtime::new()?;
    let (ytdlp_version, ffmpeg_version) =
        rt.block_on(async { tokio::join!(ytdlp.version(), ffmpeg_version(&ffmpeg)) });

    match ytdlp_version {
        Some(ref version) => println!("✓ yt-dlp: {}", version),
        None => println!("✗ yt-dlp: NOT FOUND ({})", ytdlp.program().display()),
    }

    match ffmpeg_version {
        Some(ref version) => println!("✓ ffmpeg: {}", version),
        None => println!("✗ ffmpeg: NOT FOUND ({})", ffmpeg.display()),
    }

    if ytdlp_version.is_some() && ffmpeg_version.is_some() {
        Ok(0)
    } else {
        println!();
        print_install_instructions();
        Ok(1)
    }
}

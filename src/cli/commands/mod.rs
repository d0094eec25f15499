//! CLI definition and dispatch.
//!
//! - `fetch`: the default action, fetching every song in a list
//! - `tools`: checking that yt-dlp and ffmpeg are installed

mod fetch;
mod tools;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::acquire::Bitrate;

pub use fetch::cmd_fetch;
pub use tools::cmd_check_tools;

/// Download MP3s for a list of song names
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Plain text file with one song name per line
    #[arg(required_unless_present = "check_tools")]
    pub input: Option<PathBuf>,

    /// Output folder (default: "songs converted <date>" in Downloads)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Parallel downloads (default: 4)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Folder searched for already downloaded songs (default: Downloads)
    #[arg(long, conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Never copy from the cache folder, always download
    #[arg(long)]
    pub no_cache: bool,

    /// MP3 bitrate, e.g. 192k
    #[arg(short, long)]
    pub bitrate: Option<Bitrate>,

    /// Do not embed the video thumbnail as cover art
    #[arg(long)]
    pub no_thumbnail: bool,

    /// Path to the yt-dlp executable
    #[arg(long, value_name = "PATH", env = "SONG_FETCH_YT_DLP")]
    pub yt_dlp: Option<PathBuf>,

    /// Config file (default: song-fetch/config.toml in the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Check that yt-dlp and ffmpeg are installed, then exit
    #[arg(long)]
    pub check_tools: bool,
}

/// Run the command described by the parsed arguments.
pub fn run_command(cli: &Cli) -> anyhow::Result<ExitCode> {
    let code = if cli.check_tools {
        cmd_check_tools(cli)?
    } else {
        cmd_fetch(cli)?
    };
    Ok(ExitCode::from(code))
}

//! Song Fetch - download MP3s for a list of song names.
//!
//! Each name is either found in the output folder already, copied from a
//! local cache folder (normally Downloads), or searched and downloaded with
//! yt-dlp, then tagged with its title.

pub mod acquire;
pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod organizer;
pub mod platform;
pub mod request;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<ExitCode> {
    let args = cli::Cli::parse();

    // Logs go to stderr; stdout carries only the per-song results
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("song_fetch=info".parse()?))
        .init();

    cli::run_command(&args)
}

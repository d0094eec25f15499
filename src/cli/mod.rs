//! Command-line interface for song-fetch.
//!
//! Parses arguments, resolves paths and settings, and prints the
//! per-song results.

mod commands;

pub use commands::{Cli, run_command};

//! Command-line interface for chapterize
//!
//! Provides argument parsing using clap derive macros.

use crate::config::{BackendChoice, Config};
use crate::pipeline::Stage;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Turn a video into a labeled chapter list
#[derive(Parser, Debug)]
#[command(
    name = "chapterize",
    version,
    about = "Turn a video into a labeled chapter list"
)]
pub struct Cli {
    /// Subcommand to execute (default: run the pipeline)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory that relative artifact paths resolve against
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Labeling backend (auto picks remote when an API key is set)
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<BackendChoice>,

    /// Transcript segments per labeling request
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Labeling requests run concurrently per batch
    #[arg(long, short = 'j', value_name = "N")]
    pub parallelism: Option<usize>,

    /// Labeling call timeout. Examples: 90s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Label only this leading fraction of the transcript and frames (0 < F <= 1)
    #[arg(long, value_name = "F")]
    pub sample_fraction: Option<f64>,
}

/// Parse a timeout string.
///
/// Bare numbers are seconds; anything else goes through `humantime`
/// (`30s`, `2m`, `1m30s`).
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Apply command-line overrides on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(backend) = self.backend {
            config.labeling.backend = backend;
        }
        if let Some(size) = self.chunk_size {
            config.labeling.chunk_size = size;
        }
        if let Some(parallelism) = self.parallelism {
            config.labeling.parallelism = parallelism;
        }
        if let Some(timeout) = self.timeout {
            // Sub-second timeouts round up to one second
            let secs = timeout.as_secs().max(1);
            config.local.timeout_secs = secs;
            config.remote.request_timeout_secs = Some(secs);
        }
        if self.sample_fraction.is_some() {
            config.labeling.sample_fraction = self.sample_fraction;
        }
        config.paths = config.paths.resolve(&self.workdir);
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which stage artifacts are present
    Status,

    /// Delete stage artifacts so the next run recomputes them
    Clean {
        /// Stages to clean
        #[arg(value_enum, required_unless_present = "all")]
        stages: Vec<Stage>,

        /// Clean every stage
        #[arg(long, conflicts_with = "stages")]
        all: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

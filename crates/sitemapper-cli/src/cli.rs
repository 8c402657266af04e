//! # CLI Structure and Argument Parsing
//!
//! Command-line interface for `sitemapper`, built with `clap` derive macros.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Publish sitemap.xml
//! sitemapper generate
//!
//! # Dry run that lists every URL and why it was excluded
//! sitemapper generate --debug
//!
//! # Machine-readable report
//! sitemapper generate --format json
//!
//! # Scheduled trigger, e.g. from crontab
//! sitemapper cron
//! sitemapper cron --key "$SITEMAP_KEY"
//!
//! # Inspect and configure
//! sitemapper status
//! sitemapper config init
//! ```
//!
//! ## Configuration
//!
//! `--config` (or `SITEMAPPER_CONFIG`) selects a config file explicitly.
//! Otherwise `./sitemapper.toml` and then the platform config directory are
//! tried before falling back to built-in defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::{OutputArgs, OutputFormat};

/// Main CLI structure for the `sitemapper` command
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "sitemapper - XML sitemap generator for CMS site snapshots", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to configuration file (overrides autodiscovery). Also via `SITEMAPPER_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "SITEMAPPER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Build the sitemap and publish it to `<site_root>/sitemap.xml`
    Generate {
        /// Dry run: list included and excluded URLs without touching the file
        #[arg(long)]
        debug: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove the published sitemap
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate only if the configured interval has elapsed
    Cron {
        /// Override key that bypasses the interval check
        #[arg(long, env = "SITEMAPPER_CRON_KEY", hide_env_values = true)]
        key: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the published sitemap and scheduler state
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Inspect or create configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    /// Output format selected for this command, if it has one.
    #[must_use]
    pub fn format(&self) -> Option<OutputFormat> {
        match self {
            Self::Generate { output, .. }
            | Self::Delete { output }
            | Self::Cron { output, .. }
            | Self::Status { output } => Some(output.resolve()),
            Self::Config { .. } => None,
        }
    }
}

/// `config` subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Write a default configuration file
    Init {
        /// Destination (defaults to ./sitemapper.toml)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration file in use
    Path,
}

//! Command implementations
//!
//! Each command receives an already-configured [`SitemapService`] (or the
//! raw config location for `config` subcommands) and prints its own output.

mod config;
mod cron;
mod delete;
mod generate;
mod status;

use anyhow::{Context, Result};
use sitemapper_core::{Config, SitemapService};
use std::path::{Path, PathBuf};
use tracing::debug;

pub use config::execute as config;
pub use cron::execute as cron;
pub use delete::execute as delete;
pub use generate::execute as generate;
pub use status::execute as status;

/// Discover configuration and build the service.
pub fn load_service(explicit: Option<&Path>) -> Result<(SitemapService, Option<PathBuf>)> {
    let (config, source) = Config::discover(explicit).context("Failed to load configuration")?;
    match &source {
        Some(path) => debug!(path = %path.display(), "Using configuration file"),
        None => debug!("No configuration file found, using defaults"),
    }
    Ok((SitemapService::from_config(config), source))
}

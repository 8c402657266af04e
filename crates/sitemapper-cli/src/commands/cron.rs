//! `sitemapper cron`

use anyhow::{Context, Result};
use chrono::Utc;
use sitemapper_core::SitemapService;

use crate::output::{OutputFormat, TextFormatter, print_json};

/// Generate if the interval has elapsed or `key` unlocks an early run.
pub fn execute(service: &SitemapService, key: Option<&str>, format: OutputFormat) -> Result<()> {
    let run = service
        .run_scheduled(Utc::now(), key)
        .context("Scheduled generation failed")?;

    match format {
        OutputFormat::Json => print_json(&run)?,
        OutputFormat::Text => print!("{}", TextFormatter::scheduled(&run)),
    }
    Ok(())
}

//! `sitemapper status`

use anyhow::{Context, Result};
use sitemapper_core::SitemapService;

use crate::output::{OutputFormat, TextFormatter, print_json};

pub fn execute(service: &SitemapService, format: OutputFormat) -> Result<()> {
    let status = service.status().context("Failed to read sitemap status")?;
    match format {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Text => print!("{}", TextFormatter::status(&status)),
    }
    Ok(())
}

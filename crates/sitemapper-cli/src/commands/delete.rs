//! `sitemapper delete`

use anyhow::{Context, Result};
use sitemapper_core::SitemapService;

use crate::output::{DeleteOutput, OutputFormat, TextFormatter, print_json};

/// Remove the published sitemap. A missing file is not an error.
pub fn execute(service: &SitemapService, format: OutputFormat) -> Result<()> {
    let deleted = service.delete().context("Failed to delete sitemap")?;
    let path = service.store().path();

    match format {
        OutputFormat::Json => print_json(&DeleteOutput { deleted, path })?,
        OutputFormat::Text => print!("{}", TextFormatter::deleted(deleted, path)),
    }
    Ok(())
}

//! JSON output shapes

use anyhow::Result;
use serde::Serialize;
use sitemapper_core::{Generation, GenerationReport, UrlRecord};
use std::path::Path;

/// Print any serializable value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// `generate` result. URL listings are only attached to debug runs.
#[derive(Debug, Serialize)]
pub struct GenerateOutput<'a> {
    #[serde(flatten)]
    pub report: &'a GenerationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<&'a UrlRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<&'a UrlRecord>>,
}

impl<'a> GenerateOutput<'a> {
    /// Shape for a finished generation.
    pub fn new(report: &'a GenerationReport, generation: Option<&'a Generation>) -> Self {
        let listing = generation.filter(|g| g.debug);
        Self {
            report,
            written_to: generation.and_then(|g| g.written_to.as_deref()),
            includes: listing.map(|g| g.urls.includes().values().collect()),
            excludes: listing.map(|g| g.urls.excludes().values().collect()),
        }
    }
}

/// `delete` result.
#[derive(Debug, Serialize)]
pub struct DeleteOutput<'a> {
    pub deleted: bool,
    pub path: &'a Path,
}

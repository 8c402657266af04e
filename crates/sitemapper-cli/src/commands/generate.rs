//! `sitemapper generate`

use anyhow::{Context, Result};
use sitemapper_core::{GenerationReport, SitemapService};

use crate::output::{GenerateOutput, OutputFormat, TextFormatter, print_json};

/// Run one generation and print its report.
///
/// JSON output always prints the report, including on failure, before the
/// error is returned for the exit code.
pub fn execute(service: &SitemapService, debug: bool, format: OutputFormat) -> Result<()> {
    let result = service.generate(debug);
    let report = GenerationReport::from_result(&result);

    match format {
        OutputFormat::Json => print_json(&GenerateOutput::new(&report, result.as_ref().ok()))?,
        OutputFormat::Text => {
            if let Ok(generation) = &result {
                print!("{}", TextFormatter::generation(&report, generation));
            }
        },
    }

    result.map(drop).context("Sitemap generation failed")
}

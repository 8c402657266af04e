//! Text output formatting

use colored::Colorize;
use sitemapper_core::{
    Generation, GenerationReport, ScheduledRun, SitemapStatus, TriggerReason, UrlRecord,
};
use std::fmt::Write as _;
use std::path::Path;

pub struct TextFormatter;

impl TextFormatter {
    /// Summary line plus, for debug runs, both URL listings.
    pub fn generation(report: &GenerationReport, generation: &Generation) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", "✓".green(), report.message);
        if !generation.debug {
            return out;
        }

        let includes = generation.urls.includes();
        let _ = writeln!(out, "\n{} ({})", "Included".green().bold(), includes.len());
        for record in includes.values() {
            Self::record_line(&mut out, record);
        }

        let excludes = generation.urls.excludes();
        let _ = writeln!(out, "\n{} ({})", "Excluded".yellow().bold(), excludes.len());
        for record in excludes.values() {
            Self::record_line(&mut out, record);
            for reason in &record.exclude {
                let _ = writeln!(
                    out,
                    "      {} {}: {}",
                    "-".dimmed(),
                    reason.kind.label(),
                    reason.message
                );
            }
        }
        out
    }

    fn record_line(out: &mut String, record: &UrlRecord) {
        let _ = writeln!(
            out,
            "  {}  {} {} [{}]",
            record.loc.cyan(),
            record.changefreq,
            record.priority,
            record.types.join(", ").dimmed()
        );
    }

    pub fn scheduled(run: &ScheduledRun) -> String {
        match run {
            ScheduledRun::Ran { reason, report } => {
                let why = match reason {
                    TriggerReason::FirstRun => "first run",
                    TriggerReason::Due => "interval elapsed",
                    TriggerReason::KeyOverride => "override key",
                };
                format!("{} {} ({why})\n", "✓".green(), report.message)
            },
            ScheduledRun::Skipped { next_due } => format!(
                "{} Not due yet, next run after {}\n",
                "·".dimmed(),
                next_due.to_rfc3339()
            ),
        }
    }

    pub fn status(status: &SitemapStatus) -> String {
        let mut out = String::new();
        let state = if status.exists {
            format!("{} URLs", status.url_count).green().to_string()
        } else {
            "not published".yellow().to_string()
        };
        let _ = writeln!(out, "{}  {}", "Sitemap:".bold(), status.path.display());
        let _ = writeln!(out, "{}    {state}", "State:".bold());
        let last_run = status
            .last_run
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
        let _ = writeln!(out, "{} {last_run}", "Last run:".bold());
        if let Some(next_due) = status.next_due {
            let _ = writeln!(out, "{} {}", "Next due:".bold(), next_due.to_rfc3339());
        }
        out
    }

    pub fn deleted(deleted: bool, path: &Path) -> String {
        if deleted {
            format!("{} Deleted {}\n", "✓".green(), path.display())
        } else {
            format!("{} No sitemap at {}\n", "·".dimmed(), path.display())
        }
    }
}

//! Sitemap XML reading.
//!
//! Parses a persisted `sitemap.xml` back into entries. Used by status reporting
//! and to verify rendered output.
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemapper_core::sitemap::parse_sitemap;
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/page1</loc>
//!     <lastmod>2024-01-15</lastmod>
//!   </url>
//! </urlset>"#;
//!
//! let entries = parse_sitemap(xml)?;
//! assert_eq!(entries.len(), 1);
//! # Ok::<(), sitemapper_core::Error>(())
//! ```

use crate::types::{ChangeFrequency, Priority};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

/// A single `<url>` entry of a sitemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapEntry {
    /// Absolute URL.
    pub loc: String,
    /// Last modification time, if present and parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<DateTime<Utc>>,
    /// Change frequency hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<ChangeFrequency>,
    /// Priority hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Parse sitemap XML into entries.
///
/// Entries without `<loc>` are skipped. Invalid optional values are dropped
/// rather than failing the whole document.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the XML is malformed.
pub fn parse_sitemap(xml: &str) -> Result<Vec<SitemapEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current_loc: Option<String> = None;
    let mut current_lastmod: Option<DateTime<Utc>> = None;
    let mut current_changefreq: Option<ChangeFrequency> = None;
    let mut current_priority: Option<Priority> = None;
    let mut in_url = false;
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" => {
                        in_url = true;
                        current_loc = None;
                        current_lastmod = None;
                        current_changefreq = None;
                        current_priority = None;
                    },
                    "loc" | "lastmod" | "changefreq" | "priority" if in_url => {
                        current_element = Some(name);
                    },
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "url" && in_url {
                    if let Some(loc) = current_loc.take() {
                        entries.push(SitemapEntry {
                            loc,
                            lastmod: current_lastmod.take(),
                            changefreq: current_changefreq.take(),
                            priority: current_priority.take(),
                        });
                    }
                    in_url = false;
                }
                current_element = None;
            },
            Ok(Event::Text(e)) => {
                if let Some(ref element) = current_element {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    let text = text.trim();

                    match element.as_str() {
                        "loc" => current_loc = Some(text.to_string()),
                        "lastmod" => current_lastmod = parse_lastmod(text),
                        "changefreq" => current_changefreq = text.parse().ok(),
                        "priority" => current_priority = Priority::parse(text).ok(),
                        _ => {},
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    Ok(entries)
}

/// Parse a timestamp in any of the formats producers commonly emit.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, and `YYYY-MM-DD[T| ]HH:MM:SS[.fff]`
/// without offset (taken as UTC).
#[must_use]
pub fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }

    tracing::debug!(date_str = %s, "Could not parse lastmod date");
    None
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::disallowed_macros,
    clippy::unnecessary_wraps
)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_basic_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/page1</loc>
    <changefreq>daily</changefreq>
    <priority>0.8</priority>
    <lastmod>2024-01-15T10:30:00+00:00</lastmod>
  </url>
</urlset>"#;

        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].loc, "https://example.com/page1");
        assert_eq!(entries[0].changefreq, Some(ChangeFrequency::Daily));
        assert_eq!(entries[0].priority.as_ref().map(Priority::as_str), Some("0.8"));
        assert_eq!(
            entries[0].lastmod,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_skips_urls_without_loc() {
        let xml = r#"<urlset>
  <url><priority>0.5</priority></url>
  <url><loc>https://example.com/kept</loc></url>
</urlset>"#;
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].loc, "https://example.com/kept");
    }

    #[test]
    fn test_handles_empty_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#;
        assert!(parse_sitemap(xml).unwrap().is_empty());
    }

    #[test]
    fn test_handles_malformed_xml() {
        let xml = "<urlset><url><loc>https://example.com</loc></urlx></urlset>";
        assert!(matches!(parse_sitemap(xml), Err(Error::Parse(_))));
    }

    #[test]
    fn test_handles_xml_entities() {
        let xml = r"<urlset><url><loc>https://example.com/?a=1&amp;b=2</loc></url></urlset>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries[0].loc, "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_invalid_optional_values_dropped() {
        let xml = r"<urlset><url>
  <loc>https://example.com/</loc>
  <changefreq>sometimes</changefreq>
  <priority>7</priority>
  <lastmod>last tuesday</lastmod>
</url></urlset>";
        let entries = parse_sitemap(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].changefreq.is_none());
        assert!(entries[0].priority.is_none());
        assert!(entries[0].lastmod.is_none());
    }

    #[test]
    fn test_lastmod_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_lastmod("2024-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_lastmod("2024-01-15T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_lastmod("2024-01-15T10:30:00"), Some(expected));
        assert_eq!(parse_lastmod("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(
            parse_lastmod("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_lastmod("0000-00-00 00:00:00"), None);
        assert_eq!(parse_lastmod("soon"), None);
    }
}

//! Sitemap 0.9 XML rendering.
//!
//! [`XmlRenderer`] writes the included records as a `<urlset>` document and
//! runs the configured regex replacements over the result. The output is
//! computed once per renderer.

use crate::config::RegexReplacement;
use crate::types::UrlRecord;
use crate::{Error, Result};
use chrono::SecondsFormat;
use once_cell::unsync::OnceCell;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Sitemap protocol namespace.
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Compiled post-processing step.
#[derive(Debug, Clone)]
pub struct CompiledReplacement {
    pattern: Regex,
    replacement: String,
}

/// Compile replacement pairs, skipping empty patterns.
///
/// # Errors
///
/// Returns [`Error::Config`] for a pattern that does not compile.
pub fn compile_replacements(entries: &[RegexReplacement]) -> Result<Vec<CompiledReplacement>> {
    entries
        .iter()
        .filter(|entry| !entry.pattern.is_empty())
        .map(|entry| {
            let pattern = Regex::new(&entry.pattern).map_err(|e| {
                Error::Config(format!("Invalid regexp pattern '{}': {e}", entry.pattern))
            })?;
            Ok(CompiledReplacement {
                pattern,
                replacement: entry.replacement.clone(),
            })
        })
        .collect()
}

/// Apply each replacement to the output of the previous one.
#[must_use]
pub fn apply_post_processing(xml: &str, replacements: &[CompiledReplacement]) -> String {
    replacements.iter().fold(xml.to_string(), |acc, step| {
        step.pattern
            .replace_all(&acc, step.replacement.as_str())
            .into_owned()
    })
}

/// Serialize records as a sitemap `<urlset>`, in map order.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the writer fails.
pub fn render_urlset<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a UrlRecord>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write(
        &mut writer,
        Event::Start(BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NAMESPACE)])),
    )?;

    for record in records {
        write(&mut writer, Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &record.loc)?;
        write_text_element(&mut writer, "changefreq", record.changefreq.as_str())?;
        write_text_element(&mut writer, "priority", record.priority.as_str())?;
        if let Some(lastmod) = record.lastmod {
            let stamp = lastmod.to_rfc3339_opts(SecondsFormat::Secs, false);
            write_text_element(&mut writer, "lastmod", &stamp)?;
        }
        write(&mut writer, Event::End(BytesEnd::new("url")))?;
    }

    write(&mut writer, Event::End(BytesEnd::new("urlset")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::Serialization(e.to_string()))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Serialization(e.to_string()))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

/// Memoizing renderer for one generation.
#[derive(Debug)]
pub struct XmlRenderer {
    replacements: Vec<CompiledReplacement>,
    xml: OnceCell<String>,
}

impl XmlRenderer {
    /// Create a renderer with the given post-processing steps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a pattern does not compile.
    pub fn new(replacements: &[RegexReplacement]) -> Result<Self> {
        Ok(Self {
            replacements: compile_replacements(replacements)?,
            xml: OnceCell::new(),
        })
    }

    /// Render `includes`. The first successful result is returned on every
    /// later call.
    pub fn render(&self, includes: &BTreeMap<String, UrlRecord>) -> Result<&str> {
        self.xml
            .get_or_try_init(|| {
                let xml = render_urlset(includes.values())?;
                let xml = apply_post_processing(&xml, &self.replacements);
                debug!(
                    urls = includes.len(),
                    bytes = xml.len(),
                    replacements = self.replacements.len(),
                    "Rendered sitemap"
                );
                Ok(xml)
            })
            .map(String::as_str)
    }
}

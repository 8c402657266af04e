//! URL plugins: extra record sources beyond the menu tree.
//!
//! A plugin implements [`UrlPlugin`] and is added to a [`PluginRegistry`].
//! During a generation every plugin is asked once, in registration order, for
//! its [`RawUrlRecord`]s. Raw records are loosely typed on purpose so that
//! hand-written JSON and older producers keep working; [`RawUrlRecord::normalize`]
//! turns them into checked [`PluginRecord`]s.
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemapper_core::plugin::{GenerationContext, PluginRegistry, RawUrlRecord, UrlPlugin};
//! use sitemapper_core::Result;
//!
//! struct Articles;
//!
//! impl UrlPlugin for Articles {
//!     fn name(&self) -> &str {
//!         "articles"
//!     }
//!
//!     fn collect(&self, _ctx: &GenerationContext<'_>) -> Result<Vec<RawUrlRecord>> {
//!         Ok(vec![RawUrlRecord::with_loc("/blog/hello-world")])
//!     }
//! }
//!
//! let mut registry = PluginRegistry::new();
//! registry.register(Box::new(Articles));
//! assert_eq!(registry.names(), vec!["articles"]);
//! ```

use crate::config::{FilterConfig, SiteConfig};
use crate::sitemap::parse_lastmod;
use crate::types::{ChangeFrequency, ExclusionKind, ExclusionReason, Priority, UNKNOWN_ORIGIN};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database null date some producers emit for "never modified".
pub const NULL_DATE: &str = "0000-00-00 00:00:00";

/// Message attached to boolean `exclude: true` records.
const FLAG_EXCLUDE_MESSAGE: &str = "Excluded by plugin";

/// Read-only view of the generation handed to plugins.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Site settings.
    pub site: &'a SiteConfig,
    /// Filter snapshot, including default hints.
    pub filters: &'a FilterConfig,
    /// Keys of the home page and home menu items.
    pub home_keys: &'a [String],
    /// Keys of menu items under an allowed menu type.
    pub menu_keys: &'a [String],
}

/// A source of additional sitemap URLs.
pub trait UrlPlugin {
    /// Short identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Produce raw records. An `Err` aborts the generation.
    fn collect(&self, ctx: &GenerationContext<'_>) -> Result<Vec<RawUrlRecord>>;
}

/// Ordered collection of plugins.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn UrlPlugin>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin; it runs after every plugin registered before it.
    pub fn register(&mut self, plugin: Box<dyn UrlPlugin>) {
        self.plugins.push(plugin);
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn UrlPlugin> {
        self.plugins.iter().map(|plugin| &**plugin)
    }

    /// Plugin names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|plugin| plugin.name()).collect()
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Priority as producers send it: `"0.8"` or `0.8`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPriority {
    /// Textual form.
    Text(String),
    /// Numeric form.
    Number(f64),
}

/// One structured exclusion from a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExclusion {
    /// Plugin-defined label.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Human-readable detail.
    #[serde(alias = "message", default)]
    pub msg: String,
}

/// Exclusion field as producers send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawExclude {
    /// `true` excludes without detail, `false` is a no-op.
    Flag(bool),
    /// Legacy free-text reason.
    Legacy(String),
    /// Structured reasons.
    List(Vec<RawExclusion>),
}

impl RawExclude {
    fn into_reasons(self) -> Vec<ExclusionReason> {
        match self {
            Self::Flag(false) => Vec::new(),
            Self::Flag(true) => vec![ExclusionReason::new(
                ExclusionKind::Unknown,
                FLAG_EXCLUDE_MESSAGE,
            )],
            Self::Legacy(msg) if msg.trim().is_empty() => Vec::new(),
            Self::Legacy(msg) => vec![ExclusionReason::new(ExclusionKind::Unknown, msg)],
            Self::List(items) => items
                .into_iter()
                .map(|item| {
                    let kind = if item.kind.is_empty() {
                        ExclusionKind::Unknown
                    } else {
                        ExclusionKind::Plugin(item.kind)
                    };
                    ExclusionReason::new(kind, item.msg)
                })
                .collect(),
        }
    }
}

/// Loosely typed record as returned by a plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawUrlRecord {
    /// Raw route or link. Records without one are skipped.
    #[serde(default)]
    pub loc: Option<String>,
    /// Origin label.
    #[serde(rename = "type", default)]
    pub origin: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Change frequency keyword.
    #[serde(default)]
    pub changefreq: Option<String>,
    /// Priority.
    #[serde(default)]
    pub priority: Option<RawPriority>,
    /// Last modification, RFC 3339, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub lastmod: Option<String>,
    /// Exclusion diagnostics.
    #[serde(default)]
    pub exclude: Option<RawExclude>,
}

/// Checked plugin record.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRecord {
    /// Raw route, resolved by the router later.
    pub loc: String,
    /// Origin label.
    pub origin: String,
    /// Title, possibly empty.
    pub title: String,
    /// Change frequency.
    pub changefreq: ChangeFrequency,
    /// Priority.
    pub priority: Priority,
    /// Last modification.
    pub lastmod: Option<DateTime<Utc>>,
    /// Plugin-supplied exclusions.
    pub exclude: Vec<ExclusionReason>,
}

impl RawUrlRecord {
    /// Record with only `loc` set.
    pub fn with_loc(loc: impl Into<String>) -> Self {
        Self {
            loc: Some(loc.into()),
            ..Self::default()
        }
    }

    /// Validate and fill defaults.
    ///
    /// Returns `Ok(None)` when `loc` is missing or empty. Malformed hints
    /// yield [`Error::PluginRecordInvalid`].
    pub fn normalize(self, plugin: &str, filters: &FilterConfig) -> Result<Option<PluginRecord>> {
        let Some(loc) = self.loc.filter(|l| !l.trim().is_empty()) else {
            return Ok(None);
        };
        let invalid = |reason: String| Error::PluginRecordInvalid {
            plugin: plugin.to_string(),
            reason: format!("{loc}: {reason}"),
        };

        let changefreq = match self.changefreq.as_deref().map(str::trim) {
            None | Some("") => filters.changefreq,
            Some(text) => text
                .parse::<ChangeFrequency>()
                .map_err(|e| invalid(e.to_string()))?,
        };

        let priority = match self.priority {
            None => filters.priority.clone(),
            Some(RawPriority::Text(text)) if text.trim().is_empty() => filters.priority.clone(),
            Some(RawPriority::Text(text)) => {
                Priority::parse(&text).map_err(|e| invalid(e.to_string()))?
            },
            Some(RawPriority::Number(value)) => {
                Priority::from_value(value).map_err(|e| invalid(e.to_string()))?
            },
        };

        let lastmod = match self.lastmod.as_deref().map(str::trim) {
            None | Some("" | NULL_DATE) => None,
            Some(text) => Some(
                parse_lastmod(text)
                    .ok_or_else(|| invalid(format!("unrecognized lastmod '{text}'")))?,
            ),
        };

        Ok(Some(PluginRecord {
            origin: self
                .origin
                .filter(|o| !o.is_empty())
                .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string()),
            title: self.title.unwrap_or_default(),
            changefreq,
            priority,
            lastmod,
            exclude: self.exclude.map(RawExclude::into_reasons).unwrap_or_default(),
            loc,
        }))
    }
}

/// Plugin serving records from a JSON file (an array of [`RawUrlRecord`]).
///
/// The file is read on every [`UrlPlugin::collect`] call.
#[derive(Debug, Clone)]
pub struct StaticUrlsPlugin {
    name: String,
    path: PathBuf,
}

impl StaticUrlsPlugin {
    /// Plugin named after the file stem.
    #[must_use]
    pub fn from_file(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map_or_else(|| "static".to_string(), |s| s.to_string_lossy().into_owned());
        Self {
            name,
            path: path.to_path_buf(),
        }
    }

    /// Source file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UrlPlugin for StaticUrlsPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn collect(&self, _ctx: &GenerationContext<'_>) -> Result<Vec<RawUrlRecord>> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            Error::DataSourceUnavailable(format!(
                "Plugin '{}' failed to read {}: {e}",
                self.name,
                self.path.display()
            ))
        })?;
        let values: Vec<serde_json::Value> = serde_json::from_str(&json).map_err(|e| {
            Error::DataSourceUnavailable(format!(
                "Plugin '{}' failed to parse {}: {e}",
                self.name,
                self.path.display()
            ))
        })?;

        let total = values.len();
        let records: Vec<RawUrlRecord> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match self.decode_record(index, value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(plugin = %self.name, error = %e, "Skipping malformed plugin record");
                    None
                },
            })
            .collect();
        debug!(
            plugin = %self.name,
            records = records.len(),
            skipped = total - records.len(),
            "Collected plugin records"
        );
        Ok(records)
    }
}

impl StaticUrlsPlugin {
    fn decode_record(&self, index: usize, value: serde_json::Value) -> Result<RawUrlRecord> {
        serde_json::from_value(value).map_err(|e| Error::PluginRecordInvalid {
            plugin: self.name.clone(),
            reason: format!("record {index}: {e}"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn filters() -> FilterConfig {
        Config::default().filter_config()
    }

    fn parse(json: &str) -> RawUrlRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_loc_is_skipped() {
        assert!(parse("{}").normalize("p", &filters()).unwrap().is_none());
        assert!(
            parse(r#"{"loc": "  "}"#)
                .normalize("p", &filters())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_defaults_fill_missing_hints() {
        let record = RawUrlRecord::with_loc("/a")
            .normalize("p", &filters())
            .unwrap()
            .unwrap();

        assert_eq!(record.origin, UNKNOWN_ORIGIN);
        assert_eq!(record.changefreq, ChangeFrequency::Weekly);
        assert_eq!(record.priority.as_str(), "0.5");
        assert!(record.lastmod.is_none());
        assert!(record.exclude.is_empty());
    }

    #[test]
    fn test_full_record() {
        // Given: A record with every field set
        let raw = parse(
            r#"{"loc": "/blog/post", "type": "Articles", "title": "Post",
                "changefreq": "daily", "priority": 0.8, "lastmod": "2024-03-01 10:30:00"}"#,
        );

        // When
        let record = raw.normalize("articles", &filters()).unwrap().unwrap();

        // Then
        assert_eq!(record.origin, "Articles");
        assert_eq!(record.title, "Post");
        assert_eq!(record.changefreq, ChangeFrequency::Daily);
        assert_eq!(record.priority.value(), 0.8);
        assert_eq!(
            record.lastmod,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_null_date_is_absent() {
        let raw = parse(r#"{"loc": "/a", "lastmod": "0000-00-00 00:00:00"}"#);
        let record = raw.normalize("p", &filters()).unwrap().unwrap();
        assert!(record.lastmod.is_none());
    }

    #[test]
    fn test_invalid_hints_are_rejected() {
        let cases = [
            r#"{"loc": "/a", "changefreq": "sometimes"}"#,
            r#"{"loc": "/a", "priority": "1.5"}"#,
            r#"{"loc": "/a", "priority": -1}"#,
            r#"{"loc": "/a", "lastmod": "yesterday"}"#,
        ];
        for json in cases {
            let err = parse(json).normalize("bad", &filters()).unwrap_err();
            assert!(
                matches!(err, Error::PluginRecordInvalid { ref plugin, .. } if plugin == "bad"),
                "{json}: {err}"
            );
        }
    }

    #[test]
    fn test_exclude_shapes() {
        let legacy = parse(r#"{"loc": "/a", "exclude": "Hidden category"}"#)
            .normalize("p", &filters())
            .unwrap()
            .unwrap();
        assert_eq!(legacy.exclude.len(), 1);
        assert_eq!(legacy.exclude[0].kind, ExclusionKind::Unknown);
        assert_eq!(legacy.exclude[0].message, "Hidden category");

        let empty = parse(r#"{"loc": "/a", "exclude": ""}"#)
            .normalize("p", &filters())
            .unwrap()
            .unwrap();
        assert!(empty.exclude.is_empty());

        let flag = parse(r#"{"loc": "/a", "exclude": true}"#)
            .normalize("p", &filters())
            .unwrap()
            .unwrap();
        assert_eq!(flag.exclude.len(), 1);

        let no_flag = parse(r#"{"loc": "/a", "exclude": false}"#)
            .normalize("p", &filters())
            .unwrap()
            .unwrap();
        assert!(no_flag.exclude.is_empty());

        let list = parse(
            r#"{"loc": "/a", "exclude": [
                {"type": "Content", "msg": "Article unpublished"},
                {"type": "Content", "message": "Category unpublished"}
            ]}"#,
        )
        .normalize("p", &filters())
        .unwrap()
        .unwrap();
        assert_eq!(list.exclude.len(), 2);
        assert_eq!(list.exclude[0].kind, ExclusionKind::Plugin("Content".into()));
        assert_eq!(list.exclude[1].message, "Category unpublished");
    }

    #[test]
    fn test_registry_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut registry = PluginRegistry::new();
        assert!(registry.is_empty());

        registry.register(Box::new(StaticUrlsPlugin::from_file(&dir.path().join("zeta.json"))));
        registry.register(Box::new(StaticUrlsPlugin::from_file(&dir.path().join("alpha.json"))));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_static_plugin_reads_file() {
        // Given: A JSON file with two records
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.json");
        fs::write(&path, r#"[{"loc": "/a"}, {"title": "no loc"}]"#).unwrap();
        let plugin = StaticUrlsPlugin::from_file(&path);

        let site = SiteConfig::default();
        let filters = filters();
        let ctx = GenerationContext {
            site: &site,
            filters: &filters,
            home_keys: &[],
            menu_keys: &[],
        };

        // When
        let records = plugin.collect(&ctx).unwrap();

        // Then
        assert_eq!(plugin.name(), "articles");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].loc.as_deref(), Some("/a"));
    }

    #[test]
    fn test_static_plugin_skips_type_malformed_records() {
        // Given: One good record next to records with wrong JSON types
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.json");
        fs::write(
            &path,
            r#"[
                {"loc": "/good"},
                {"loc": "/bad-priority", "priority": true},
                {"loc": "/bad-exclude", "exclude": 1},
                {"loc": 123}
            ]"#,
        )
        .unwrap();
        let plugin = StaticUrlsPlugin::from_file(&path);
        let site = SiteConfig::default();
        let filters = filters();
        let ctx = GenerationContext {
            site: &site,
            filters: &filters,
            home_keys: &[],
            menu_keys: &[],
        };

        // When
        let records = plugin.collect(&ctx).unwrap();

        // Then: Only the well-formed record survives
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].loc.as_deref(), Some("/good"));

        let err = plugin
            .decode_record(1, serde_json::json!({"priority": true}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PluginRecordInvalid { ref plugin, .. } if plugin == "articles"
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_static_plugin_non_array_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.json");
        fs::write(&path, r#"{"loc": "/a"}"#).unwrap();
        let plugin = StaticUrlsPlugin::from_file(&path);
        let site = SiteConfig::default();
        let filters = filters();
        let ctx = GenerationContext {
            site: &site,
            filters: &filters,
            home_keys: &[],
            menu_keys: &[],
        };

        assert!(matches!(
            plugin.collect(&ctx),
            Err(Error::DataSourceUnavailable(_))
        ));
    }

    #[test]
    fn test_static_plugin_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let plugin = StaticUrlsPlugin::from_file(&dir.path().join("missing.json"));
        let site = SiteConfig::default();
        let filters = filters();
        let ctx = GenerationContext {
            site: &site,
            filters: &filters,
            home_keys: &[],
            menu_keys: &[],
        };

        assert!(matches!(
            plugin.collect(&ctx),
            Err(Error::DataSourceUnavailable(_))
        ));
    }
}

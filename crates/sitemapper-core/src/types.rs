//! Core data types shared by the generation pipeline.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Origin label used for records contributed by the menu tree.
pub const MENU_ORIGIN: &str = "menu";

/// Origin label used when a plugin record does not declare its type.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Change frequency hints from the sitemap protocol.
///
/// Ordered from most to least frequent; [`ChangeFrequency::rank`] exposes the
/// ordinal used when two sources disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// Ordinal rank, `1` (always) through `7` (never).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Always => 1,
            Self::Hourly => 2,
            Self::Daily => 3,
            Self::Weekly => 4,
            Self::Monthly => 5,
            Self::Yearly => 6,
            Self::Never => 7,
        }
    }

    /// Protocol keyword as written into `<changefreq>`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl Default for ChangeFrequency {
    fn default() -> Self {
        Self::Weekly
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(Error::Parse(format!("Invalid changefreq value: {s}"))),
        }
    }
}

/// Sitemap priority, a decimal between `0.0` and `1.0`.
///
/// The original textual form is kept so `0.85` renders as `0.85`, while
/// comparisons use the numeric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Priority {
    text: String,
    value: f64,
}

impl Priority {
    /// Parse a priority string, rejecting values outside `0.0..=1.0`.
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let value: f64 = text
            .parse()
            .map_err(|_| Error::Parse(format!("Invalid priority value: {s}")))?;
        Self::checked(text.to_string(), value)
    }

    /// Build a priority from a numeric value.
    pub fn from_value(value: f64) -> Result<Self> {
        let text = if value.fract() == 0.0 {
            format!("{value:.1}")
        } else {
            value.to_string()
        };
        Self::checked(text, value)
    }

    fn checked(text: String, value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::Parse(format!(
                "Priority {text} is outside the 0.0-1.0 range"
            )));
        }
        Ok(Self { text, value })
    }

    /// Numeric value used for conflict resolution.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Text written into `<priority>`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self {
            text: "0.5".to_string(),
            value: 0.5,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Priority {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.text
    }
}

/// Why a URL was kept out of the published sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    /// Menu item belongs to a menu type outside the configured filter.
    MenuType,
    /// Robots meta carries `noindex`.
    Robots,
    /// Menu item is unpublished.
    Unpublished,
    /// Menu item is in the trash.
    Trashed,
    /// Alias, separator, heading or external URL item.
    SystemType,
    /// Bound component is not installed.
    ComponentMissing,
    /// Bound component is installed but disabled.
    ComponentDisabled,
    /// Anonymous visitors cannot view the item.
    Access,
    /// Link resolved to an empty string.
    NullLink,
    /// Link matched a raw filter entry.
    RawFilter,
    /// Link matched a configured substring.
    SubstringFilter,
    /// Link is not under any allowed menu item.
    MenuFilter,
    /// Legacy plugin exclusion without a type.
    Unknown,
    /// Structured plugin exclusion carrying the plugin's own label.
    Plugin(String),
}

impl ExclusionKind {
    /// Coarse grouping used in reports: `menu`, `filter` or `plugin`.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MenuType
            | Self::Robots
            | Self::Unpublished
            | Self::Trashed
            | Self::SystemType
            | Self::ComponentMissing
            | Self::ComponentDisabled
            | Self::Access => "menu",
            Self::NullLink | Self::RawFilter | Self::SubstringFilter | Self::MenuFilter => {
                "filter"
            },
            Self::Unknown | Self::Plugin(_) => "plugin",
        }
    }

    /// Short human label, e.g. `menu unpublished`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::MenuType => "menu type".to_string(),
            Self::Robots => "menu robots".to_string(),
            Self::Unpublished => "menu unpublished".to_string(),
            Self::Trashed => "menu trashed".to_string(),
            Self::SystemType => "menu system type".to_string(),
            Self::ComponentMissing => "component missing".to_string(),
            Self::ComponentDisabled => "component disabled".to_string(),
            Self::Access => "menu access".to_string(),
            Self::NullLink => "null link".to_string(),
            Self::RawFilter => "raw filter".to_string(),
            Self::SubstringFilter => "substring filter".to_string(),
            Self::MenuFilter => "not in allowed menu".to_string(),
            Self::Unknown => "unknown".to_string(),
            Self::Plugin(label) => label.clone(),
        }
    }
}

/// One `{type, message}` diagnostic attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionReason {
    /// What kind of rule fired.
    #[serde(rename = "type")]
    pub kind: ExclusionKind,
    /// Human-readable detail.
    pub message: String,
}

impl ExclusionReason {
    /// Create a reason.
    pub fn new(kind: ExclusionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

/// One candidate sitemap entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Normalized link, unique within a collection.
    pub key: String,
    /// Ordered, duplicate-free origin labels.
    pub types: Vec<String>,
    /// Display title.
    pub title: String,
    /// Site-relative link.
    pub link: String,
    /// Absolute URL.
    pub loc: String,
    /// Change frequency hint.
    pub changefreq: ChangeFrequency,
    /// Priority hint.
    pub priority: Priority,
    /// Last modification time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<DateTime<Utc>>,
    /// Exclusion diagnostics; empty means included.
    #[serde(default)]
    pub exclude: Vec<ExclusionReason>,
}

impl UrlRecord {
    /// Whether any exclusion reason is attached.
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        !self.exclude.is_empty()
    }

    /// Ordinal of [`UrlRecord::changefreq`].
    #[must_use]
    pub const fn changefreq_rank(&self) -> u8 {
        self.changefreq.rank()
    }
}

/// Sizes of the three partitions of a [`UrlCollection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationCounts {
    /// Every distinct key.
    pub all: usize,
    /// Keys that made it into the sitemap.
    pub includes: usize,
    /// Keys kept out of the sitemap.
    pub excludes: usize,
}

/// The outcome of one aggregation pass.
///
/// `includes` and `excludes` partition `all`. All three maps iterate in
/// lexicographic key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlCollection {
    all: BTreeMap<String, UrlRecord>,
    includes: BTreeMap<String, UrlRecord>,
    excludes: BTreeMap<String, UrlRecord>,
}

impl UrlCollection {
    pub(crate) const fn from_parts(
        all: BTreeMap<String, UrlRecord>,
        includes: BTreeMap<String, UrlRecord>,
        excludes: BTreeMap<String, UrlRecord>,
    ) -> Self {
        Self {
            all,
            includes,
            excludes,
        }
    }

    /// Every record, keyed by normalized link.
    #[must_use]
    pub const fn all(&self) -> &BTreeMap<String, UrlRecord> {
        &self.all
    }

    /// Records published in the sitemap.
    #[must_use]
    pub const fn includes(&self) -> &BTreeMap<String, UrlRecord> {
        &self.includes
    }

    /// Records kept out of the sitemap, each with at least one reason.
    #[must_use]
    pub const fn excludes(&self) -> &BTreeMap<String, UrlRecord> {
        &self.excludes
    }

    /// Partition sizes.
    #[must_use]
    pub fn counts(&self) -> GenerationCounts {
        GenerationCounts {
            all: self.all.len(),
            includes: self.includes.len(),
            excludes: self.excludes.len(),
        }
    }

    /// Check the partition invariants.
    ///
    /// True when `includes` and `excludes` are disjoint, their union is
    /// `all`, and a key is excluded exactly when its record carries reasons.
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        if self.includes.len() + self.excludes.len() != self.all.len() {
            return false;
        }
        self.all.iter().all(|(key, record)| {
            let included = self.includes.contains_key(key);
            let excluded = self.excludes.contains_key(key);
            included != excluded && excluded == record.is_excluded()
        })
    }
}

//! Configuration management for sitemap generation.
//!
//! Settings are stored in TOML and loaded once per run into an immutable
//! [`Config`]. The generation pipeline never reads ambient state; it receives a
//! [`FilterConfig`] snapshot derived from the loaded configuration.
//!
//! ## Discovery Order
//!
//! 1. An explicit path (`--config` / `SITEMAPPER_CONFIG`)
//! 2. `./sitemapper.toml` in the working directory
//! 3. The platform config directory (`…/sitemapper/config.toml`)
//! 4. Built-in defaults
//!
//! Relative paths inside a config file resolve against that file's directory.
//! `SITEMAPPER_ROOT_URL` and `SITEMAPPER_SITE_ROOT` override the matching keys
//! after loading.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [site]
//! name = "Example Site"
//! root_url = "https://example.com/"
//! sef = true
//! robots = "index, follow"
//!
//! [defaults]
//! changefreq = "weekly"
//! priority = "0.5"
//!
//! [filters]
//! raw_index = true
//! raw_component = true
//! strpos = """
//! /tag/
//! ?print=1
//! """
//! menu = true
//! menu_types = ["mainmenu"]
//!
//! [[filters.regexp]]
//! pattern = "http://"
//! replacement = "https://"
//!
//! [paths]
//! site_root = "public"
//! snapshot = "site.json"
//! plugins = ["articles.json"]
//!
//! [cron]
//! interval_count = 1
//! interval_unit = "day"
//! ```

use crate::schedule::IntervalUnit;
use crate::types::{ChangeFrequency, Priority};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sitemapper.toml";

/// Environment variable overriding `site.root_url`.
pub const ENV_ROOT_URL: &str = "SITEMAPPER_ROOT_URL";

/// Environment variable overriding `paths.site_root`.
pub const ENV_SITE_ROOT: &str = "SITEMAPPER_SITE_ROOT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site-wide settings normally read from the CMS global configuration.
    pub site: SiteConfig,
    /// Default hints applied to every record that does not declare its own.
    pub defaults: DefaultsConfig,
    /// Exclusion filters and output post-processing.
    pub filters: FiltersConfig,
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Scheduled regeneration.
    pub cron: CronConfig,
}

/// Site-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name, used as the home page title.
    pub name: String,
    /// Absolute root URL every location is resolved against.
    pub root_url: String,
    /// Whether search-engine-friendly routes are enabled.
    pub sef: bool,
    /// Site default robots meta, overridable per menu item.
    pub robots: String,
    /// Whether language codes are appended to menu routes.
    pub multilanguage: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Home".to_string(),
            root_url: "http://localhost/".to_string(),
            sef: true,
            robots: String::new(),
            multilanguage: false,
        }
    }
}

/// Default sitemap hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Change frequency for menu items and plugin records without one.
    pub changefreq: ChangeFrequency,
    /// Priority for menu items and plugin records without one.
    pub priority: Priority,
}

/// Filter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Exclude links containing `index.php`.
    pub raw_index: bool,
    /// Exclude links containing `component/`.
    pub raw_component: bool,
    /// Exclude links carrying a query string.
    pub raw_get: bool,
    /// Newline-separated substrings; matching links are excluded.
    pub strpos: String,
    /// Restrict the sitemap to the menu types in `menu_types`.
    pub menu: bool,
    /// Allowed menu types when `menu` is on.
    pub menu_types: Vec<String>,
    /// Regex replacements applied to the rendered XML, in order.
    pub regexp: Vec<RegexReplacement>,
}

/// One pattern/replacement pair of the XML post-processing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexReplacement {
    /// Regular expression; empty patterns are skipped.
    pub pattern: String,
    /// Replacement text, `$1`-style group references allowed.
    #[serde(default)]
    pub replacement: String,
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory that receives `sitemap.xml`.
    pub site_root: PathBuf,
    /// Site snapshot with menu rows, extensions and routes.
    pub snapshot: PathBuf,
    /// JSON files of plugin URL records, loaded in order.
    pub plugins: Vec<PathBuf>,
    /// Where the scheduler records its last run.
    pub state_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            site_root: PathBuf::from("."),
            snapshot: PathBuf::from("site.json"),
            plugins: Vec::new(),
            state_file: PathBuf::from(".sitemapper-state.json"),
        }
    }
}

/// Scheduled regeneration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CronConfig {
    /// Number of `interval_unit`s between runs.
    pub interval_count: u32,
    /// Unit of the interval.
    pub interval_unit: IntervalUnit,
    /// Whether an override key is accepted.
    pub key_enabled: bool,
    /// Key that bypasses the interval check.
    pub key: Option<String>,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            interval_count: 1,
            interval_unit: IntervalUnit::Day,
            key_enabled: false,
            key: None,
        }
    }
}

/// Menu-type restriction derived from [`FiltersConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTypeFilter {
    /// Every menu type is allowed.
    Disabled,
    /// Only these menu types are allowed.
    AllowList(Vec<String>),
}

impl MenuTypeFilter {
    /// Whether `menutype` passes the filter.
    #[must_use]
    pub fn allows(&self, menutype: &str) -> bool {
        match self {
            Self::Disabled => true,
            Self::AllowList(types) => types.iter().any(|t| t == menutype),
        }
    }

    /// Whether the filter restricts anything.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::AllowList(_))
    }
}

/// Immutable filter snapshot handed to the aggregator and plugins.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Raw substrings; first match excludes.
    pub raw: Vec<String>,
    /// Literal substrings; first match excludes.
    pub substrings: Vec<String>,
    /// Menu-type allow-list.
    pub menu_types: MenuTypeFilter,
    /// Default change frequency.
    pub changefreq: ChangeFrequency,
    /// Default priority.
    pub priority: Priority,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Relative paths are resolved against the file's directory and
    /// environment overrides are applied.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::NotFound(format!("Config file {}", path.display()))
            },
            _ => Error::Config(format!("Failed to read config {}: {e}", path.display())),
        })?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Locate and load configuration following the discovery order.
    ///
    /// Returns the configuration and the file it came from, if any.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok((Self::load(&local)?, Some(local)));
        }

        if let Ok(global) = Self::global_config_path() {
            if global.exists() {
                return Ok((Self::load(&global)?, Some(global)));
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok((config, None))
    }

    /// Save the configuration as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {e}"))
                })?;
            }
        }

        fs::write(path, self.to_toml()?)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))
    }

    /// Platform config file location.
    pub fn global_config_path() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("dev", "sitemapper", "sitemapper")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root_url) = lookup(ENV_ROOT_URL).filter(|v| !v.trim().is_empty()) {
            self.site.root_url = root_url.trim().to_string();
        }
        if let Some(site_root) = lookup(ENV_SITE_ROOT).filter(|v| !v.trim().is_empty()) {
            self.paths.site_root = PathBuf::from(site_root.trim());
        }
    }

    /// Check values that TOML typing cannot express.
    pub fn validate(&self) -> Result<()> {
        self.root_url()?;
        for entry in &self.filters.regexp {
            if entry.pattern.is_empty() {
                continue;
            }
            Regex::new(&entry.pattern).map_err(|e| {
                Error::Config(format!("Invalid regexp pattern '{}': {e}", entry.pattern))
            })?;
        }
        if self.cron.interval_count == 0 {
            return Err(Error::Config("cron.interval_count must be at least 1".into()));
        }
        Ok(())
    }

    /// Parsed site root URL with a guaranteed trailing slash.
    pub fn root_url(&self) -> Result<Url> {
        let mut raw = self.site.root_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.site.root_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{}: root URL must use http or https",
                self.site.root_url
            )));
        }
        Ok(url)
    }

    /// Build the immutable filter snapshot.
    #[must_use]
    pub fn filter_config(&self) -> FilterConfig {
        let filters = &self.filters;
        let mut raw = Vec::new();
        if filters.raw_index {
            raw.push("index.php".to_string());
        }
        if filters.raw_component {
            raw.push("component/".to_string());
        }
        if filters.raw_get {
            raw.push("?".to_string());
        }

        let menu_types = if filters.menu && !filters.menu_types.is_empty() {
            MenuTypeFilter::AllowList(filters.menu_types.clone())
        } else {
            MenuTypeFilter::Disabled
        };

        FilterConfig {
            raw,
            substrings: split_substring_list(&filters.strpos),
            menu_types,
            changefreq: self.defaults.changefreq,
            priority: self.defaults.priority.clone(),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.paths.site_root);
        resolve(&mut self.paths.snapshot);
        resolve(&mut self.paths.state_file);
        for plugin in &mut self.paths.plugins {
            resolve(plugin);
        }
    }
}

/// Split a newline-separated list, trimming entries and dropping empties.
#[must_use]
pub fn split_substring_list(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

//! URL aggregation: menu tree plus plugins into one partitioned collection.
//!
//! A [`Generator`] represents a single generation request. It synthesizes the
//! home page record, folds in every menu item and then every plugin record,
//! resolving key conflicts with [`merge_records`], and finally renders the
//! included records. Both the collection and the XML are computed at most
//! once per generator.
//!
//! ## Merge policy
//!
//! When a record arrives for a key that already exists:
//!
//! - `types`: union, existing labels first
//! - `title`: the new one unless empty
//! - `changefreq`: the less frequent one; ties keep the existing value
//! - `priority`: the numerically lower one; ties keep the existing value
//! - `lastmod`: the later one
//! - `exclude`: existing reasons followed by the new ones
//!
//! A key with any exclusion reason lives in `excludes`, otherwise in
//! `includes`. Home keys never receive exclusions.

use crate::config::{Config, FilterConfig, SiteConfig};
use crate::filter::filter_link;
use crate::menu::{MenuQuery, MenuRepository, MenuSource};
use crate::plugin::{GenerationContext, PluginRecord, PluginRegistry};
use crate::render::XmlRenderer;
use crate::route::Router;
use crate::types::{MENU_ORIGIN, UrlCollection, UrlRecord};
use crate::{Error, Result};
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};
use url::Url;

/// Link of the home page for the given root URL.
///
/// With SEF URLs this is the root path with a single trailing slash, otherwise
/// `index.php`.
#[must_use]
pub fn home_link(root: &Url, sef: bool) -> String {
    if sef {
        format!("{}/", root.path().trim_end_matches('/'))
    } else {
        "index.php".to_string()
    }
}

/// Map key for a link; the empty link is keyed as `/`.
#[must_use]
pub fn link_key(link: &str) -> String {
    if link.is_empty() {
        "/".to_string()
    } else {
        link.to_string()
    }
}

/// Absolute location of `link` relative to the site root.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the link cannot be joined.
pub fn resolve_loc(root: &Url, link: &str) -> Result<String> {
    root.join(link)
        .map(String::from)
        .map_err(|e| Error::InvalidUrl(format!("{link}: {e}")))
}

/// Site-relative form of a link, so absolute and relative spellings of the
/// same page share one key.
///
/// Relative links are returned unchanged. Absolute links on the site's
/// origin are reduced to their path and query.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the link cannot be joined or points at
/// another origin.
pub fn site_link(root: &Url, link: &str) -> Result<String> {
    let resolved = root
        .join(link)
        .map_err(|e| Error::InvalidUrl(format!("{link}: {e}")))?;
    if resolved.origin() != root.origin() {
        return Err(Error::InvalidUrl(format!(
            "{link}: outside site {}",
            root.origin().ascii_serialization()
        )));
    }
    if Url::parse(link).is_err() && !link.starts_with("//") {
        return Ok(link.to_string());
    }
    Ok(match resolved.query() {
        Some(query) => format!("{}?{query}", resolved.path()),
        None => resolved.path().to_string(),
    })
}

/// Combine an incoming record with the one already stored under its key.
#[must_use]
pub fn merge_records(existing: &UrlRecord, incoming: UrlRecord) -> UrlRecord {
    let mut types = existing.types.clone();
    for label in incoming.types {
        if !types.contains(&label) {
            types.push(label);
        }
    }

    let title = if incoming.title.is_empty() {
        existing.title.clone()
    } else {
        incoming.title
    };

    let changefreq = if existing.changefreq_rank() >= incoming.changefreq.rank() {
        existing.changefreq
    } else {
        incoming.changefreq
    };

    let priority = if existing.priority.value() <= incoming.priority.value() {
        existing.priority.clone()
    } else {
        incoming.priority
    };

    let lastmod = match (existing.lastmod, incoming.lastmod) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    let mut exclude = existing.exclude.clone();
    exclude.extend(incoming.exclude);

    UrlRecord {
        key: incoming.key,
        types,
        title,
        link: incoming.link,
        loc: incoming.loc,
        changefreq,
        priority,
        lastmod,
        exclude,
    }
}

/// Mutable state of one aggregation pass.
#[derive(Debug, Default)]
struct Partition {
    all: BTreeMap<String, UrlRecord>,
    includes: BTreeMap<String, UrlRecord>,
    excludes: BTreeMap<String, UrlRecord>,
}

impl Partition {
    fn insert(&mut self, record: UrlRecord) {
        let record = match self.all.get(&record.key) {
            Some(existing) => merge_records(existing, record),
            None => record,
        };

        let key = record.key.clone();
        if record.is_excluded() {
            self.includes.remove(&key);
            self.excludes.insert(key.clone(), record.clone());
        } else {
            self.excludes.remove(&key);
            self.includes.insert(key.clone(), record.clone());
        }
        self.all.insert(key, record);
    }

    fn finish(self) -> UrlCollection {
        UrlCollection::from_parts(self.all, self.includes, self.excludes)
    }
}

/// One generation request.
pub struct Generator<'a> {
    site: &'a SiteConfig,
    filters: FilterConfig,
    root: Url,
    repository: &'a dyn MenuRepository,
    router: &'a dyn Router,
    plugins: &'a PluginRegistry,
    menu: MenuSource<'a>,
    renderer: XmlRenderer,
    urls: OnceCell<UrlCollection>,
}

impl<'a> Generator<'a> {
    /// Prepare a generation.
    ///
    /// # Errors
    ///
    /// Fails on an invalid root URL or post-processing pattern.
    pub fn new(
        config: &'a Config,
        repository: &'a dyn MenuRepository,
        router: &'a dyn Router,
        plugins: &'a PluginRegistry,
    ) -> Result<Self> {
        Ok(Self {
            site: &config.site,
            filters: config.filter_config(),
            root: config.root_url()?,
            repository,
            router,
            plugins,
            menu: MenuSource::new(repository),
            renderer: XmlRenderer::new(&config.filters.regexp)?,
            urls: OnceCell::new(),
        })
    }

    /// The partitioned URL collection.
    ///
    /// # Errors
    ///
    /// Propagates data-source failures from the menu repository or a plugin.
    pub fn urls(&self) -> Result<&UrlCollection> {
        self.urls.get_or_try_init(|| self.aggregate())
    }

    /// Sitemap XML for the included records.
    ///
    /// # Errors
    ///
    /// Propagates [`Generator::urls`] failures and writer errors.
    pub fn xml(&self) -> Result<&str> {
        let urls = self.urls()?;
        self.renderer.render(urls.includes())
    }

    #[instrument(skip_all, fields(plugins = self.plugins.len(), root = %self.root))]
    fn aggregate(&self) -> Result<UrlCollection> {
        let mut partition = Partition::default();
        let mut home_keys: Vec<String> = Vec::new();
        let mut menu_keys: Vec<String> = Vec::new();

        let home = self.home_record()?;
        home_keys.push(home.key.clone());
        partition.insert(home);

        let guest_access = self
            .repository
            .guest_access_levels()
            .map_err(|e| Error::DataSourceUnavailable(e.to_string()))?;
        let query = MenuQuery {
            multilanguage: self.site.multilanguage,
            menu_types: &self.filters.menu_types,
            site_robots: &self.site.robots,
            guest_access: &guest_access,
        };

        for item in self.menu.list_menu_items(&query)? {
            let link = self.router.route(&item.loc);
            let key = link_key(&link);
            let exempt = item.home || home_keys.contains(&key);

            let exclude = if exempt {
                Vec::new()
            } else {
                let mut reasons = item.exclude.clone();
                reasons.extend(filter_link(
                    &link,
                    &self.filters.raw,
                    &self.filters.substrings,
                    None,
                ));
                reasons
            };

            if item.home {
                home_keys.push(key.clone());
            } else if self.filters.menu_types.is_active()
                && self.filters.menu_types.allows(&item.menutype)
            {
                menu_keys.push(key.clone());
            }

            partition.insert(UrlRecord {
                loc: resolve_loc(&self.root, &link)?,
                key,
                types: vec![MENU_ORIGIN.to_string()],
                title: item.title.clone(),
                link,
                changefreq: self.filters.changefreq,
                priority: self.filters.priority.clone(),
                lastmod: None,
                exclude,
            });
        }
        debug!(
            menu_urls = partition.all.len(),
            home_keys = home_keys.len(),
            menu_keys = menu_keys.len(),
            "Aggregated menu items"
        );

        let ctx = GenerationContext {
            site: self.site,
            filters: &self.filters,
            home_keys: &home_keys,
            menu_keys: &menu_keys,
        };
        let menu_allow = self
            .filters
            .menu_types
            .is_active()
            .then_some(menu_keys.as_slice());

        for plugin in self.plugins.iter() {
            let name = plugin.name();
            let raw_records = plugin.collect(&ctx)?;
            let mut accepted = 0usize;

            for raw in raw_records {
                let record = match raw.normalize(name, &self.filters) {
                    Ok(Some(record)) => record,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(plugin = name, error = %e, "Skipping invalid plugin record");
                        continue;
                    },
                };
                match self.plugin_url(record, &home_keys, menu_allow) {
                    Ok(url) => {
                        partition.insert(url);
                        accepted += 1;
                    },
                    Err(e) => {
                        warn!(
                            plugin = name,
                            error = %e,
                            "Skipping plugin record outside the site"
                        );
                    },
                }
            }
            debug!(plugin = name, accepted, "Merged plugin records");
        }

        let collection = partition.finish();
        let counts = collection.counts();
        debug!(
            all = counts.all,
            includes = counts.includes,
            excludes = counts.excludes,
            "Aggregation complete"
        );
        Ok(collection)
    }

    fn home_record(&self) -> Result<UrlRecord> {
        let link = home_link(&self.root, self.site.sef);
        Ok(UrlRecord {
            key: link_key(&link),
            types: vec![MENU_ORIGIN.to_string()],
            title: self.site.name.clone(),
            loc: resolve_loc(&self.root, &link)?,
            link,
            changefreq: self.filters.changefreq,
            priority: self.filters.priority.clone(),
            lastmod: None,
            exclude: Vec::new(),
        })
    }

    fn plugin_url(
        &self,
        record: PluginRecord,
        home_keys: &[String],
        menu_allow: Option<&[String]>,
    ) -> Result<UrlRecord> {
        let link = site_link(&self.root, &self.router.route(&record.loc))?;
        let key = link_key(&link);
        let loc = resolve_loc(&self.root, &link)?;

        let exclude = if home_keys.contains(&key) {
            Vec::new()
        } else {
            let mut reasons = record.exclude;
            reasons.extend(filter_link(
                &link,
                &self.filters.raw,
                &self.filters.substrings,
                menu_allow,
            ));
            reasons
        };

        Ok(UrlRecord {
            key,
            types: vec![record.origin],
            title: record.title,
            link,
            loc,
            changefreq: record.changefreq,
            priority: record.priority,
            lastmod: record.lastmod,
            exclude,
        })
    }
}

impl std::fmt::Debug for Generator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("root", &self.root.as_str())
            .field("plugins", self.plugins)
            .field("memoized", &self.urls.get().is_some())
            .finish_non_exhaustive()
    }
}

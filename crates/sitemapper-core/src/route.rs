//! Route resolution from raw CMS routes to site-relative links.
//!
//! Menu items and plugins hand over raw routes such as `index.php?Itemid=12`.
//! With search-engine-friendly URLs enabled the site publishes them under a
//! different path (`/blog/my-post`); the [`Router`] performs that mapping.

use std::collections::HashMap;

/// Maps a raw route to the link that becomes the record key.
pub trait Router {
    /// Resolve `raw`. Must be deterministic for a given router.
    fn route(&self, raw: &str) -> String;
}

/// Returns every route unchanged. Used when SEF URLs are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughRouter;

impl Router for PassthroughRouter {
    fn route(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Lookup table of raw route to SEF link, exported with the site snapshot.
///
/// Routes missing from the table pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, String>,
}

impl RouteTable {
    /// Build a table from `(raw, link)` pairs.
    pub fn new<I, K, V>(routes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Number of known routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Router for RouteTable {
    fn route(&self, raw: &str) -> String {
        self.routes
            .get(raw)
            .cloned()
            .unwrap_or_else(|| raw.to_string())
    }
}

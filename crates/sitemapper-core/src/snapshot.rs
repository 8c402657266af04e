//! Site snapshot: a JSON export of the CMS tables the generator reads.
//!
//! ```json
//! {
//!   "menu": [
//!     { "id": 101, "menutype": "mainmenu", "title": "Home", "type": "component",
//!       "link": "index.php?option=com_content&view=featured",
//!       "published": 1, "access": 1, "home": true, "lft": 1, "component_id": 22 }
//!   ],
//!   "extensions": [ { "extension_id": 22, "element": "com_content", "enabled": true } ],
//!   "routes": { "index.php?Itemid=102": "/blog" },
//!   "guest_access_levels": [1, 5]
//! }
//! ```

use crate::menu::{ComponentInfo, MenuRepository, MenuRow};
use crate::route::RouteTable;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Public access level of a stock install.
pub const PUBLIC_ACCESS_LEVEL: u32 = 1;

/// A menu row as exported, with the component still referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMenuRow {
    /// Row data.
    #[serde(flatten)]
    pub row: MenuRow,
    /// Foreign key into `extensions`.
    #[serde(default)]
    pub component_id: Option<u64>,
}

/// One row of the extension table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// Primary key.
    pub extension_id: u64,
    /// Element name, e.g. `com_content`.
    pub element: String,
    /// Whether the extension is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Exported CMS state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    /// Menu table.
    #[serde(default)]
    pub menu: Vec<SnapshotMenuRow>,
    /// Extension table.
    #[serde(default)]
    pub extensions: Vec<Extension>,
    /// SEF routes, raw route to link.
    #[serde(default)]
    pub routes: BTreeMap<String, String>,
    /// Access levels visible to anonymous visitors.
    #[serde(default = "default_guest_levels")]
    pub guest_access_levels: Vec<u32>,
}

const fn default_true() -> bool {
    true
}

fn default_guest_levels() -> Vec<u32> {
    vec![PUBLIC_ACCESS_LEVEL]
}

impl Default for SiteSnapshot {
    fn default() -> Self {
        Self {
            menu: Vec::new(),
            extensions: Vec::new(),
            routes: BTreeMap::new(),
            guest_access_levels: default_guest_levels(),
        }
    }
}

impl SiteSnapshot {
    /// Load a snapshot file. Any failure is reported as an unavailable data
    /// source.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            Error::DataSourceUnavailable(format!(
                "Failed to read site snapshot {}: {e}",
                path.display()
            ))
        })?;
        let snapshot: Self = serde_json::from_str(&json).map_err(|e| {
            Error::DataSourceUnavailable(format!(
                "Failed to parse site snapshot {}: {e}",
                path.display()
            ))
        })?;
        debug!(
            path = %path.display(),
            menu_rows = snapshot.menu.len(),
            extensions = snapshot.extensions.len(),
            routes = snapshot.routes.len(),
            "Loaded site snapshot"
        );
        Ok(snapshot)
    }

    /// SEF route table built from `routes`.
    #[must_use]
    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(self.routes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

impl MenuRepository for SiteSnapshot {
    fn menu_rows(&self) -> Result<Vec<MenuRow>> {
        let extensions: HashMap<u64, &Extension> = self
            .extensions
            .iter()
            .map(|ext| (ext.extension_id, ext))
            .collect();

        Ok(self
            .menu
            .iter()
            .map(|entry| {
                let mut row = entry.row.clone();
                row.component = entry
                    .component_id
                    .and_then(|id| extensions.get(&id))
                    .map(|ext| ComponentInfo {
                        name: ext.element.clone(),
                        enabled: ext.enabled,
                    });
                row
            })
            .collect())
    }

    fn guest_access_levels(&self) -> Result<Vec<u32>> {
        let mut levels = self.guest_access_levels.clone();
        levels.sort_unstable();
        levels.dedup();
        Ok(levels)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::route::Router;
    use tempfile::TempDir;

    const SNAPSHOT: &str = r#"{
        "menu": [
            { "id": 2, "menutype": "mainmenu", "title": "Blog", "type": "component",
              "link": "index.php?option=com_content&view=category&id=8",
              "published": 1, "access": 1, "lft": 3, "component_id": 22 },
            { "id": 3, "menutype": "mainmenu", "title": "Shop", "type": "component",
              "link": "index.php?option=com_shop", "published": 1, "access": 1,
              "lft": 5, "component_id": 99 }
        ],
        "extensions": [
            { "extension_id": 22, "element": "com_content", "enabled": true }
        ],
        "routes": { "index.php?Itemid=2": "/blog" },
        "guest_access_levels": [5, 1, 1]
    }"#;

    fn write_snapshot(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("site.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_and_join_components() {
        // Given: A snapshot with one installed and one missing component
        let dir = TempDir::new().unwrap();
        let snapshot = SiteSnapshot::load(&write_snapshot(&dir, SNAPSHOT)).unwrap();

        // When
        let rows = snapshot.menu_rows().unwrap();

        // Then
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].component,
            Some(ComponentInfo {
                name: "com_content".to_string(),
                enabled: true
            })
        );
        assert_eq!(rows[1].component, None);
        assert_eq!(snapshot.guest_access_levels().unwrap(), vec![1, 5]);
    }

    #[test]
    fn test_route_table_from_snapshot() {
        let dir = TempDir::new().unwrap();
        let snapshot = SiteSnapshot::load(&write_snapshot(&dir, SNAPSHOT)).unwrap();
        let routes = snapshot.route_table();

        assert_eq!(routes.route("index.php?Itemid=2"), "/blog");
        assert_eq!(routes.route("index.php?Itemid=3"), "index.php?Itemid=3");
    }

    #[test]
    fn test_missing_file_is_data_source_error() {
        let dir = TempDir::new().unwrap();
        let err = SiteSnapshot::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::DataSourceUnavailable(_)));
    }

    #[test]
    fn test_malformed_file_is_data_source_error() {
        let dir = TempDir::new().unwrap();
        let err = SiteSnapshot::load(&write_snapshot(&dir, "{\"menu\": 7}")).unwrap_err();
        assert!(matches!(err, Error::DataSourceUnavailable(_)));
    }

    #[test]
    fn test_empty_object_uses_public_access() {
        let dir = TempDir::new().unwrap();
        let snapshot = SiteSnapshot::load(&write_snapshot(&dir, "{}")).unwrap();
        assert!(snapshot.menu.is_empty());
        assert_eq!(snapshot.guest_access_levels, vec![PUBLIC_ACCESS_LEVEL]);
    }
}

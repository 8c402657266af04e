//! Menu tree source.
//!
//! Reads the CMS menu rows through a [`MenuRepository`] and turns each one
//! into a [`MenuItem`]: a raw route plus the exclusion diagnostics the CMS
//! state implies. Filters on the final link are applied later by the
//! aggregator.
//!
//! ## Exclusion checks
//!
//! Non-home items accumulate reasons independently, in this order:
//!
//! 1. menu type outside the configured allow-list
//! 2. `noindex` robots meta (item override, else site default)
//! 3. unpublished or trashed state
//! 4. system item type (`alias`, `separator`, `heading`, `url`)
//! 5. bound component missing, else bound component disabled
//! 6. access level not visible to anonymous visitors
//!
//! The home item never carries exclusions.

use crate::config::MenuTypeFilter;
use crate::types::{ExclusionKind, ExclusionReason};
use crate::{Error, Result};
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Item types that never produce a page of their own.
pub const SYSTEM_ITEM_TYPES: [&str; 4] = ["alias", "separator", "heading", "url"];

/// Published state of an unpublished item.
pub const STATE_UNPUBLISHED: i32 = 0;

/// Published state of a trashed item.
pub const STATE_TRASHED: i32 = -2;

/// Component name used when neither the extension table nor the link names one.
pub const UNKNOWN_COMPONENT: &str = "unknown";

/// Regex extracting the component from a raw `index.php?option=…` link.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static COMPONENT_OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^index.php\?option=([a-zA-Z\-0-9_]*)").unwrap());

/// Installed extension joined onto a menu row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Extension element name, e.g. `com_content`.
    pub name: String,
    /// Whether the extension is enabled.
    pub enabled: bool,
}

/// One row of the CMS menu table with its component joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRow {
    /// Primary key. `1` is the tree root.
    pub id: u64,
    /// Menu the item belongs to.
    pub menutype: String,
    /// Item title.
    pub title: String,
    /// Raw CMS link, e.g. `index.php?option=com_content&view=article&id=1`.
    #[serde(default)]
    pub link: String,
    /// Item type: `component`, `alias`, `separator`, `heading` or `url`.
    #[serde(rename = "type")]
    pub item_type: String,
    /// `1` published, `0` unpublished, `-2` trashed.
    pub published: i32,
    /// Access level required to view the item.
    pub access: u32,
    /// Whether this is the designated home item.
    #[serde(default)]
    pub home: bool,
    /// Robots meta override; `None` falls back to the site default.
    #[serde(default)]
    pub robots: Option<String>,
    /// Language code, `*` for all languages.
    #[serde(default)]
    pub language: String,
    /// Nested-set left value, defines tree order.
    #[serde(default)]
    pub lft: i64,
    /// `0` for site menus, `1` for administrator menus.
    #[serde(default)]
    pub client_id: u32,
    /// Bound component, `None` when missing from the extension table.
    #[serde(default)]
    pub component: Option<ComponentInfo>,
}

/// Read access to the CMS menu and access-level tables.
pub trait MenuRepository {
    /// Every menu row, in any order.
    fn menu_rows(&self) -> Result<Vec<MenuRow>>;

    /// Access levels an anonymous visitor is authorized to view.
    fn guest_access_levels(&self) -> Result<Vec<u32>>;
}

/// Normalized menu item ready for aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Menu row id.
    pub id: u64,
    /// Raw route, `index.php?Itemid=<id>` plus an optional `&lang=` suffix.
    pub loc: String,
    /// Item title.
    pub title: String,
    /// Menu the item belongs to.
    pub menutype: String,
    /// Whether this is the designated home item.
    pub home: bool,
    /// Resolved component name for component items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// CMS-derived exclusion diagnostics.
    pub exclude: Vec<ExclusionReason>,
}

/// Parameters of a menu listing.
#[derive(Debug, Clone, Copy)]
pub struct MenuQuery<'a> {
    /// Append `&lang=<code>` to item routes.
    pub multilanguage: bool,
    /// Menu-type restriction.
    pub menu_types: &'a MenuTypeFilter,
    /// Site default robots meta.
    pub site_robots: &'a str,
    /// Access levels an anonymous visitor may view.
    pub guest_access: &'a [u32],
}

/// Memoizing menu source for one generation.
pub struct MenuSource<'r> {
    repository: &'r dyn MenuRepository,
    items: OnceCell<Vec<MenuItem>>,
}

impl<'r> MenuSource<'r> {
    /// Wrap a repository.
    #[must_use]
    pub fn new(repository: &'r dyn MenuRepository) -> Self {
        Self {
            repository,
            items: OnceCell::new(),
        }
    }

    /// Normalized menu items in tree order.
    ///
    /// Computed on the first call; later calls return the same slice and
    /// ignore `query`.
    pub fn list_menu_items(&self, query: &MenuQuery<'_>) -> Result<&[MenuItem]> {
        self.items
            .get_or_try_init(|| {
                let mut rows = self.repository.menu_rows().map_err(|err| match err {
                    Error::DataSourceUnavailable(msg) => Error::DataSourceUnavailable(msg),
                    other => Error::DataSourceUnavailable(other.to_string()),
                })?;
                rows.retain(|row| row.id > 1 && row.client_id == 0);
                rows.sort_by_key(|row| row.lft);

                let items: Vec<MenuItem> = rows.iter().map(|row| normalize(row, query)).collect();
                debug!(
                    rows = items.len(),
                    excluded = items.iter().filter(|i| !i.exclude.is_empty()).count(),
                    "Loaded menu items"
                );
                Ok(items)
            })
            .map(Vec::as_slice)
    }
}

fn normalize(row: &MenuRow, query: &MenuQuery<'_>) -> MenuItem {
    let is_component = row.item_type == "component";
    let component = is_component.then(|| component_name(row));

    let mut loc = format!("index.php?Itemid={}", row.id);
    if query.multilanguage && !row.language.is_empty() && row.language != "*" {
        loc.push_str("&lang=");
        loc.push_str(&row.language);
    }

    let exclude = if row.home {
        Vec::new()
    } else {
        exclusions(row, component.as_deref(), query)
    };

    MenuItem {
        id: row.id,
        loc,
        title: row.title.clone(),
        menutype: row.menutype.clone(),
        home: row.home,
        component,
        exclude,
    }
}

fn exclusions(row: &MenuRow, component: Option<&str>, query: &MenuQuery<'_>) -> Vec<ExclusionReason> {
    let mut reasons = Vec::new();

    if query.menu_types.is_active() && !query.menu_types.allows(&row.menutype) {
        reasons.push(ExclusionReason::new(
            ExclusionKind::MenuType,
            format!("Menu '{}' is not selected", row.menutype),
        ));
    }

    let robots = row
        .robots
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(query.site_robots);
    if robots.contains("noindex") {
        reasons.push(ExclusionReason::new(
            ExclusionKind::Robots,
            format!("Robots meta is '{robots}'"),
        ));
    }

    match row.published {
        STATE_UNPUBLISHED => reasons.push(ExclusionReason::new(
            ExclusionKind::Unpublished,
            "Menu item is unpublished",
        )),
        STATE_TRASHED => reasons.push(ExclusionReason::new(
            ExclusionKind::Trashed,
            "Menu item is trashed",
        )),
        _ => {},
    }

    if SYSTEM_ITEM_TYPES.contains(&row.item_type.as_str()) {
        reasons.push(ExclusionReason::new(
            ExclusionKind::SystemType,
            format!("Menu item type is '{}'", row.item_type),
        ));
    }

    if let Some(name) = component {
        match &row.component {
            None => reasons.push(ExclusionReason::new(
                ExclusionKind::ComponentMissing,
                format!("Component '{name}' is not installed"),
            )),
            Some(info) if !info.enabled => reasons.push(ExclusionReason::new(
                ExclusionKind::ComponentDisabled,
                format!("Component '{name}' is disabled"),
            )),
            Some(_) => {},
        }
    }

    if !query.guest_access.contains(&row.access) {
        reasons.push(ExclusionReason::new(
            ExclusionKind::Access,
            format!("Access level {} is not public", row.access),
        ));
    }

    reasons
}

/// Installed component name, else the `option=` of the raw link, else `unknown`.
fn component_name(row: &MenuRow) -> String {
    if let Some(info) = row.component.as_ref().filter(|c| !c.name.is_empty()) {
        return info.name.clone();
    }
    COMPONENT_OPTION_RE
        .captures(&row.link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_COMPONENT)
        .to_string()
}

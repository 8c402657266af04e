//! End-to-end aggregation scenarios against in-memory menus and plugins.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::disallowed_macros,
    clippy::float_cmp
)]

use proptest::prelude::*;
use sitemapper_core::menu::{ComponentInfo, MenuRepository, MenuRow};
use sitemapper_core::plugin::{GenerationContext, RawUrlRecord, UrlPlugin};
use sitemapper_core::route::{PassthroughRouter, RouteTable};
use sitemapper_core::sitemap::parse_sitemap;
use sitemapper_core::{
    Config, Error, ExclusionKind, Generator, PluginRegistry, Result, UrlCollection,
};

struct Menu {
    rows: Vec<MenuRow>,
}

impl MenuRepository for Menu {
    fn menu_rows(&self) -> Result<Vec<MenuRow>> {
        Ok(self.rows.clone())
    }

    fn guest_access_levels(&self) -> Result<Vec<u32>> {
        Ok(vec![1])
    }
}

struct Records {
    name: &'static str,
    records: Vec<RawUrlRecord>,
}

impl UrlPlugin for Records {
    fn name(&self) -> &str {
        self.name
    }

    fn collect(&self, _ctx: &GenerationContext<'_>) -> Result<Vec<RawUrlRecord>> {
        Ok(self.records.clone())
    }
}

struct Broken;

impl UrlPlugin for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn collect(&self, _ctx: &GenerationContext<'_>) -> Result<Vec<RawUrlRecord>> {
        Err(Error::DataSourceUnavailable("articles table missing".into()))
    }
}

fn row(id: u64, menutype: &str, title: &str) -> MenuRow {
    MenuRow {
        id,
        menutype: menutype.to_string(),
        title: title.to_string(),
        link: "index.php?option=com_content&view=article".to_string(),
        item_type: "component".to_string(),
        published: 1,
        access: 1,
        home: false,
        robots: None,
        language: "*".to_string(),
        lft: i64::try_from(id).unwrap(),
        client_id: 0,
        component: Some(ComponentInfo {
            name: "com_content".to_string(),
            enabled: true,
        }),
    }
}

fn site_menu() -> Menu {
    let mut home = row(2, "mainmenu", "Welcome");
    home.home = true;
    let blog = row(3, "mainmenu", "Blog");
    let mut draft = row(4, "mainmenu", "Draft");
    draft.published = 0;
    let legal = row(5, "footer", "Legal");
    Menu {
        rows: vec![home, blog, draft, legal],
    }
}

fn routes() -> RouteTable {
    RouteTable::new([
        ("index.php?Itemid=2", "/"),
        ("index.php?Itemid=3", "/blog"),
        ("index.php?Itemid=4", "/draft"),
        ("index.php?Itemid=5", "/legal"),
    ])
}

fn config() -> Config {
    let mut config = Config::default();
    config.site.name = "Example".to_string();
    config.site.root_url = "https://example.com/".to_string();
    config
}

fn raw(json: &str) -> RawUrlRecord {
    serde_json::from_str(json).unwrap()
}

fn registry(records: Vec<RawUrlRecord>) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(Box::new(Records {
        name: "articles",
        records,
    }));
    registry
}

fn kinds(urls: &UrlCollection, key: &str) -> Vec<ExclusionKind> {
    urls.all()[key]
        .exclude
        .iter()
        .map(|r| r.kind.clone())
        .collect()
}

#[test]
fn home_and_menu_items_are_partitioned() {
    // Given: A menu with home, a page, a draft and a footer item
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = PluginRegistry::new();
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    // When
    let urls = generator.urls().unwrap();

    // Then
    assert!(urls.is_partitioned());
    let includes: Vec<_> = urls.includes().keys().map(String::as_str).collect();
    assert_eq!(includes, vec!["/", "/blog", "/legal"]);
    assert_eq!(kinds(urls, "/draft"), vec![ExclusionKind::Unpublished]);

    // The home menu item replaces the synthesized title
    assert_eq!(urls.all()["/"].title, "Welcome");
    assert_eq!(urls.all()["/"].types, vec!["menu"]);
}

#[test]
fn home_survives_raw_filters_without_sef() {
    // Given: SEF off, so every link contains index.php, and the raw filter on
    let mut config = config();
    config.site.sef = false;
    config.filters.raw_index = true;
    let menu = site_menu();
    let plugins = PluginRegistry::new();
    let generator = Generator::new(&config, &menu, &PassthroughRouter, &plugins).unwrap();

    // When
    let urls = generator.urls().unwrap();

    // Then: Home keys are included, everything else is filtered
    assert!(urls.includes().contains_key("index.php"));
    assert!(urls.includes().contains_key("index.php?Itemid=2"));
    assert_eq!(urls.includes().len(), 2);
    assert_eq!(
        kinds(urls, "index.php?Itemid=3"),
        vec![ExclusionKind::RawFilter]
    );
    assert_eq!(
        urls.all()["index.php"].loc,
        "https://example.com/index.php"
    );
}

#[test]
fn plugin_records_merge_with_menu_records() {
    // Given: Two plugin records for /blog with different hints
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![
        raw(r#"{"loc": "index.php?Itemid=3", "type": "Articles", "priority": "0.3",
                "changefreq": "monthly", "lastmod": "2024-01-01"}"#),
        raw(r#"{"loc": "/blog", "type": "Tags", "priority": "0.8", "title": "",
                "lastmod": "2024-03-01T00:00:00Z"}"#),
    ]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    // When
    let urls = generator.urls().unwrap();
    let blog = &urls.includes()["/blog"];

    // Then
    assert_eq!(blog.types, vec!["menu", "Articles", "Tags"]);
    assert_eq!(blog.title, "Blog");
    assert_eq!(blog.priority.as_str(), "0.3");
    assert_eq!(blog.changefreq.as_str(), "monthly");
    assert_eq!(
        blog.lastmod.map(|d| d.to_rfc3339()),
        Some("2024-03-01T00:00:00+00:00".to_string())
    );
}

#[test]
fn plugin_exclusion_overrides_prior_include() {
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![
        raw(r#"{"loc": "/blog", "exclude": [{"type": "Content", "msg": "Category hidden"}]}"#),
        raw(r#"{"loc": "/blog"}"#),
    ]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    let urls = generator.urls().unwrap();

    assert!(urls.excludes().contains_key("/blog"));
    assert!(!urls.includes().contains_key("/blog"));
    assert_eq!(
        kinds(urls, "/blog"),
        vec![ExclusionKind::Plugin("Content".to_string())]
    );
    assert!(urls.is_partitioned());
}

#[test]
fn home_key_ignores_plugin_exclusions() {
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![raw(r#"{"loc": "/", "exclude": "legacy reason"}"#)]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    let urls = generator.urls().unwrap();
    assert!(urls.includes().contains_key("/"));
}

#[test]
fn menu_filter_restricts_plugin_records() {
    // Given: Only mainmenu is allowed
    let mut config = config();
    config.filters.menu = true;
    config.filters.menu_types = vec!["mainmenu".to_string()];
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![
        raw(r#"{"loc": "/blog/first-post"}"#),
        raw(r#"{"loc": "/shop/item-1"}"#),
        raw(r#"{"loc": "/legal/terms"}"#),
    ]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    // When
    let urls = generator.urls().unwrap();

    // Then: Footer menu items are excluded by type, plugin links by membership
    assert_eq!(kinds(urls, "/legal"), vec![ExclusionKind::MenuType]);
    assert!(urls.includes().contains_key("/blog/first-post"));
    assert_eq!(kinds(urls, "/shop/item-1"), vec![ExclusionKind::MenuFilter]);
    assert_eq!(kinds(urls, "/legal/terms"), vec![ExclusionKind::MenuFilter]);
    assert!(urls.includes().contains_key("/"));
}

#[test]
fn substring_filter_applies_to_all_sources() {
    let mut config = config();
    config.filters.strpos = "/legal\n/tag/".to_string();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![raw(r#"{"loc": "/blog/tag/rust"}"#)]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    let urls = generator.urls().unwrap();

    assert_eq!(kinds(urls, "/legal"), vec![ExclusionKind::SubstringFilter]);
    assert_eq!(
        kinds(urls, "/blog/tag/rust"),
        vec![ExclusionKind::SubstringFilter]
    );
}

#[test]
fn invalid_plugin_records_are_skipped() {
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![
        raw(r#"{"loc": "/bad", "priority": "9"}"#),
        raw(r#"{"title": "no loc"}"#),
        raw(r#"{"loc": "/good"}"#),
    ]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    let urls = generator.urls().unwrap();

    assert!(!urls.all().contains_key("/bad"));
    assert!(urls.includes().contains_key("/good"));
    assert_eq!(urls.all()["/good"].types, vec!["unknown"]);
}

#[test]
fn absolute_plugin_locs_stay_on_site() {
    // Given: An off-site link and two absolute spellings of site pages
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![
        raw(r#"{"loc": "https://other.site/x", "type": "Links"}"#),
        raw(r#"{"loc": "https://example.com/blog", "type": "Tags"}"#),
        raw(r#"{"loc": "https://example.com/news?page=2", "type": "News"}"#),
    ]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    // When
    let urls = generator.urls().unwrap();
    let xml = generator.xml().unwrap();

    // Then: The off-site record is dropped, the others share site keys
    assert!(urls.all().values().all(|r| !r.loc.contains("other.site")));
    assert_eq!(urls.includes()["/blog"].types, vec!["menu", "Tags"]);
    assert_eq!(
        urls.includes()["/news?page=2"].loc,
        "https://example.com/news?page=2"
    );
    let entries = parse_sitemap(xml).unwrap();
    let blog = entries
        .iter()
        .filter(|e| e.loc == "https://example.com/blog")
        .count();
    assert_eq!(blog, 1);
    assert_eq!(entries.len(), 4);
}

#[test]
fn failing_plugin_aborts_generation() {
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let mut plugins = PluginRegistry::new();
    plugins.register(Box::new(Broken));
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    assert!(matches!(
        generator.urls(),
        Err(Error::DataSourceUnavailable(_))
    ));
}

#[test]
fn generation_is_memoized_and_deterministic() {
    let config = config();
    let menu = site_menu();
    let routes = routes();
    let plugins = registry(vec![raw(r#"{"loc": "/blog/post", "priority": 0.7}"#)]);
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    let first = generator.urls().unwrap();
    let second = generator.urls().unwrap();
    assert!(std::ptr::eq(first, second));

    let xml = generator.xml().unwrap().to_string();
    assert_eq!(generator.xml().unwrap(), xml);

    // A fresh generator produces the same document
    let again = Generator::new(&config, &menu, &routes, &plugins).unwrap();
    assert_eq!(again.xml().unwrap(), xml);

    let entries = parse_sitemap(&xml).unwrap();
    let locs: Vec<_> = entries.iter().map(|e| e.loc.as_str()).collect();
    assert_eq!(
        locs,
        vec![
            "https://example.com/",
            "https://example.com/blog",
            "https://example.com/blog/post",
            "https://example.com/legal",
        ]
    );
}

#[test]
fn post_processing_rewrites_output() {
    let mut config = config();
    config.filters.regexp = vec![sitemapper_core::config::RegexReplacement {
        pattern: "https://example.com".to_string(),
        replacement: "https://cdn.example.com".to_string(),
    }];
    let menu = site_menu();
    let routes = routes();
    let plugins = PluginRegistry::new();
    let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

    let xml = generator.xml().unwrap();
    assert!(xml.contains("<loc>https://cdn.example.com/blog</loc>"));
    assert!(!xml.contains("<loc>https://example.com/"));
}

fn arb_record() -> impl Strategy<Value = RawUrlRecord> {
    (
        prop::sample::select(vec!["/", "/blog", "/draft", "/a", "/b", "/tag/x", ""]),
        prop::option::of(prop::sample::select(vec!["0.1", "0.5", "0.9", "2"])),
        prop::option::of(prop::sample::select(vec!["daily", "yearly", "bogus"])),
        prop::option::of(prop::sample::select(vec!["", "hidden"])),
    )
        .prop_map(|(loc, priority, changefreq, exclude)| {
            let mut json = serde_json::json!({ "loc": loc });
            if let Some(p) = priority {
                json["priority"] = p.into();
            }
            if let Some(c) = changefreq {
                json["changefreq"] = c.into();
            }
            if let Some(e) = exclude {
                json["exclude"] = e.into();
            }
            serde_json::from_value(json).unwrap()
        })
}

proptest! {
    #[test]
    fn partition_invariants_hold(
        records in prop::collection::vec(arb_record(), 0..12),
        strpos in prop::sample::select(vec!["", "/tag/", "/b"]),
        menu_filter in any::<bool>(),
    ) {
        let mut config = config();
        config.filters.strpos = strpos.to_string();
        config.filters.menu = menu_filter;
        config.filters.menu_types = vec!["mainmenu".to_string()];
        let menu = site_menu();
        let routes = routes();
        let plugins = registry(records);
        let generator = Generator::new(&config, &menu, &routes, &plugins).unwrap();

        let urls = generator.urls().unwrap();

        prop_assert!(urls.is_partitioned());
        prop_assert!(urls.includes().contains_key("/"));
        for (key, record) in urls.all() {
            prop_assert_eq!(record.is_excluded(), urls.excludes().contains_key(key));
            prop_assert_eq!(&record.key, key);
        }
        let keys: Vec<_> = urls.all().keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }
}

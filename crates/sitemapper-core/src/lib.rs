//! # sitemapper-core
//!
//! Core functionality for sitemapper - an XML sitemap generator for CMS sites.
//!
//! The crate reads an exported snapshot of the site's menu tree, gathers extra
//! URLs from plugins, decides which URLs belong in the sitemap and writes a
//! sitemap 0.9 document.
//!
//! ## Architecture
//!
//! - **Menu source**: menu rows to candidate URLs with CMS-derived exclusions
//! - **Plugins**: an ordered registry of extra URL sources
//! - **Aggregator**: merges both by key and partitions into includes/excludes
//! - **Filter**: raw, substring and menu-membership rules on links
//! - **Renderer**: sitemap XML with regex post-processing
//! - **Service**: generate, delete, scheduled runs and status over storage
//!
//! ## Quick Start
//!
//! ```no_run
//! use sitemapper_core::{Config, GenerationReport, SitemapService};
//!
//! let (config, _source) = Config::discover(None)?;
//! let service = SitemapService::from_config(config);
//!
//! let result = service.generate(true);
//! let report = GenerationReport::from_result(&result);
//! println!("{}", report.message);
//! # Ok::<(), sitemapper_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`]. Only malformed plugin records
//! are tolerated; they are logged and skipped:
//!
//! ```rust
//! use sitemapper_core::Error;
//!
//! let err = Error::PluginRecordInvalid {
//!     plugin: "articles".into(),
//!     reason: "bad priority".into(),
//! };
//! assert!(!err.is_fatal());
//! ```

/// URL aggregation and merge policy
pub mod aggregator;
/// Configuration loading, discovery and filter snapshots
pub mod config;
/// Error types and result aliases
pub mod error;
/// Link filter bank
pub mod filter;
/// Menu tree source
pub mod menu;
/// Plugin trait, registry and raw record normalization
pub mod plugin;
/// Sitemap XML rendering
pub mod render;
/// Raw route to link resolution
pub mod route;
/// Interval gate for triggered regeneration
pub mod schedule;
/// High-level generate/delete/cron/status operations
pub mod service;
/// Sitemap XML reading
pub mod sitemap;
/// Site snapshot file
pub mod snapshot;
/// Sitemap and scheduler state persistence
pub mod storage;
/// Core data types and structures
pub mod types;

// Re-export commonly used types
pub use aggregator::Generator;
pub use config::{Config, FilterConfig, MenuTypeFilter};
pub use error::{Error, Result};
pub use plugin::{GenerationContext, PluginRegistry, RawUrlRecord, StaticUrlsPlugin, UrlPlugin};
pub use schedule::{Schedule, TriggerDecision, TriggerReason};
pub use service::{Generation, GenerationReport, ScheduledRun, SitemapService, SitemapStatus};
pub use snapshot::SiteSnapshot;
pub use types::*;

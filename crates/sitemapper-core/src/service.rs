//! High-level operations: generate, delete, scheduled runs and status.
//!
//! [`SitemapService`] ties configuration, the site snapshot, plugins and
//! storage together. Every call is a fresh generation; nothing is cached
//! between calls.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sitemapper_core::{Config, SitemapService};
//!
//! let (config, _) = Config::discover(None)?;
//! let service = SitemapService::from_config(config);
//! let generation = service.generate(false)?;
//! println!("{} URLs published", generation.urls.counts().includes);
//! # Ok::<(), sitemapper_core::Error>(())
//! ```

use crate::aggregator::Generator;
use crate::config::Config;
use crate::plugin::{PluginRegistry, StaticUrlsPlugin, UrlPlugin};
use crate::route::{PassthroughRouter, Router};
use crate::schedule::{Schedule, TriggerDecision, TriggerReason};
use crate::sitemap::parse_sitemap;
use crate::snapshot::SiteSnapshot;
use crate::storage::{SitemapStore, StateStore};
use crate::types::{GenerationCounts, UrlCollection};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Output of a generation.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    /// Partitioned records.
    pub urls: UrlCollection,
    /// Rendered sitemap.
    pub xml: String,
    /// Whether this was a dry run.
    pub debug: bool,
    /// File written, `None` for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<PathBuf>,
}

/// Outcome summary of a generation, suitable for display or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Whether the generation succeeded.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Partition sizes, zero on failure.
    pub counts: GenerationCounts,
    /// Error text on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationReport {
    /// Summarize a generation result.
    #[must_use]
    pub fn from_result(result: &Result<Generation>) -> Self {
        match result {
            Ok(generation) => {
                let counts = generation.urls.counts();
                let message = match &generation.written_to {
                    Some(path) => format!(
                        "Sitemap generated: {} URLs written to {}",
                        counts.includes,
                        path.display()
                    ),
                    None => format!(
                        "Debug generation: {} included, {} excluded, sitemap file untouched",
                        counts.includes, counts.excludes
                    ),
                };
                Self {
                    success: true,
                    message,
                    counts,
                    error: None,
                }
            },
            Err(e) => Self::from(e),
        }
    }
}

/// What a scheduled trigger did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduledRun {
    /// A generation ran.
    Ran {
        /// Why it ran.
        reason: TriggerReason,
        /// Summary of the generation.
        report: GenerationReport,
    },
    /// Too early.
    Skipped {
        /// Earliest allowed run.
        next_due: DateTime<Utc>,
    },
}

/// Published sitemap state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapStatus {
    /// Sitemap location.
    pub path: PathBuf,
    /// Whether the file exists.
    pub exists: bool,
    /// Number of `<url>` entries.
    pub url_count: usize,
    /// Last triggered run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    /// Next time a trigger would generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due: Option<DateTime<Utc>>,
}

/// Facade over the generation pipeline.
#[derive(Debug)]
pub struct SitemapService {
    config: Config,
    plugins: PluginRegistry,
    store: SitemapStore,
    state: StateStore,
}

impl SitemapService {
    /// Service with one [`StaticUrlsPlugin`] per configured plugin file.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let mut plugins = PluginRegistry::new();
        for path in &config.paths.plugins {
            plugins.register(Box::new(StaticUrlsPlugin::from_file(path)));
        }
        Self::with_plugins(config, plugins)
    }

    /// Service with an explicit plugin registry.
    #[must_use]
    pub fn with_plugins(config: Config, plugins: PluginRegistry) -> Self {
        let store = SitemapStore::new(&config.paths.site_root);
        let state = StateStore::new(&config.paths.state_file);
        Self {
            config,
            plugins,
            store,
            state,
        }
    }

    /// Append a plugin after the configured ones.
    pub fn register_plugin(&mut self, plugin: Box<dyn UrlPlugin>) {
        self.plugins.register(plugin);
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sitemap storage.
    #[must_use]
    pub const fn store(&self) -> &SitemapStore {
        &self.store
    }

    /// Run a generation. With `dry_run` set the sitemap file is left untouched.
    ///
    /// # Errors
    ///
    /// Data-source, configuration and persistence failures abort the run.
    #[instrument(skip(self))]
    pub fn generate(&self, dry_run: bool) -> Result<Generation> {
        let snapshot = SiteSnapshot::load(&self.config.paths.snapshot)?;
        let route_table;
        let router: &dyn Router = if self.config.site.sef {
            route_table = snapshot.route_table();
            &route_table
        } else {
            &PassthroughRouter
        };

        let generator = Generator::new(&self.config, &snapshot, router, &self.plugins)?;
        let urls = generator.urls()?.clone();
        let xml = generator.xml()?.to_string();

        let written_to = if dry_run {
            debug!("Dry run, sitemap file untouched");
            None
        } else {
            self.store.write(&xml)?;
            Some(self.store.path().to_path_buf())
        };

        let counts = urls.counts();
        info!(
            all = counts.all,
            includes = counts.includes,
            excludes = counts.excludes,
            dry_run,
            "Generation finished"
        );
        Ok(Generation {
            urls,
            xml,
            debug: dry_run,
            written_to,
        })
    }

    /// Remove the published sitemap. Returns `false` if none existed.
    pub fn delete(&self) -> Result<bool> {
        self.store.delete()
    }

    /// Generate if the schedule allows it at `now`.
    ///
    /// The run is recorded before generating, so a failing generation is not
    /// retried until the next interval.
    ///
    /// # Errors
    ///
    /// [`Error::AccessDenied`] for a wrong key; generation errors otherwise.
    pub fn run_scheduled(&self, now: DateTime<Utc>, key: Option<&str>) -> Result<ScheduledRun> {
        let schedule = Schedule::from_config(&self.config.cron);
        let last_run = self.state.load()?.last_run;

        match schedule.decide(last_run, now, key)? {
            TriggerDecision::Skip { next_due } => {
                debug!(%next_due, "Scheduled generation not due");
                Ok(ScheduledRun::Skipped { next_due })
            },
            TriggerDecision::Run(reason) => {
                self.state.record_run(now)?;
                let result = self.generate(false);
                let report = GenerationReport::from_result(&result);
                result?;
                Ok(ScheduledRun::Ran { reason, report })
            },
        }
    }

    /// Inspect the published sitemap and scheduler state.
    pub fn status(&self) -> Result<SitemapStatus> {
        let url_count = match self.store.read()? {
            Some(xml) => parse_sitemap(&xml)?.len(),
            None => 0,
        };
        let last_run = self.state.load()?.last_run;
        let next_due =
            last_run.map(|last| Schedule::from_config(&self.config.cron).interval().next_after(last));

        Ok(SitemapStatus {
            path: self.store.path().to_path_buf(),
            exists: self.store.exists(),
            url_count,
            last_run,
            next_due,
        })
    }
}

impl From<&Error> for GenerationReport {
    fn from(err: &Error) -> Self {
        Self {
            success: false,
            message: "Sitemap generation failed".to_string(),
            counts: GenerationCounts::default(),
            error: Some(err.to_string()),
        }
    }
}

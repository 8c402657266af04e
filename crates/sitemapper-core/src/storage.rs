//! Persistence for `sitemap.xml` and the scheduler state.
//!
//! Both files are written through a temporary sibling that is renamed into
//! place, so a reader never sees a half-written file. Concurrent writers are
//! last-writer-wins.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the published sitemap.
pub const SITEMAP_FILE: &str = "sitemap.xml";

fn write_atomic(path: &Path, content: &[u8], what: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content)
        .map_err(|e| Error::Persistence(format!("Failed to write {what}: {e}")))?;

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| Error::Persistence(format!("Failed to remove existing {what}: {e}")))?;
    }

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::Persistence(format!("Failed to commit {what}: {e}")))
}

/// The published sitemap file under the site root.
#[derive(Debug, Clone)]
pub struct SitemapStore {
    path: PathBuf,
}

impl SitemapStore {
    /// Store for `<site_root>/sitemap.xml`.
    #[must_use]
    pub fn new(site_root: &Path) -> Self {
        Self {
            path: site_root.join(SITEMAP_FILE),
        }
    }

    /// Location of the sitemap file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a sitemap is currently published.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Replace the published sitemap with `xml`.
    pub fn write(&self, xml: &str) -> Result<()> {
        write_atomic(&self.path, xml.as_bytes(), SITEMAP_FILE)?;
        info!(path = %self.path.display(), bytes = xml.len(), "Wrote sitemap");
        Ok(())
    }

    /// Remove the published sitemap. Returns `false` if there was none.
    pub fn delete(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Deleted sitemap");
                Ok(true)
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No sitemap to delete");
                Ok(false)
            },
            Err(e) => Err(Error::Persistence(format!("Failed to delete sitemap: {e}"))),
        }
    }

    /// Current sitemap content, if published.
    pub fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(xml) => Ok(Some(xml)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Persistence(format!("Failed to read sitemap: {e}"))),
        }
    }
}

/// Scheduler state persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronState {
    /// Start of the most recent triggered generation.
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

/// JSON file holding [`CronState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store at `path`.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Location of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state; a missing file is the default state.
    pub fn load(&self) -> Result<CronState> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CronState::default()),
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "Failed to read scheduler state: {e}"
                )));
            },
        };
        serde_json::from_str(&json)
            .map_err(|e| Error::Persistence(format!("Failed to parse scheduler state: {e}")))
    }

    /// Record `at` as the last run.
    pub fn record_run(&self, at: DateTime<Utc>) -> Result<()> {
        let state = CronState { last_run: Some(at) };
        let json = serde_json::to_string_pretty(&state)?;
        write_atomic(&self.path, json.as_bytes(), "scheduler state")?;
        debug!(path = %self.path.display(), last_run = %at, "Recorded scheduler run");
        Ok(())
    }
}

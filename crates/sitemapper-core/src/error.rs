//! Error types and handling for sitemapper-core operations.
//!
//! A single error enum covers every failure the generation pipeline can
//! surface. Errors are categorized so callers (the CLI, a scheduler) can decide
//! presentation without string matching.
//!
//! ## Error Categories
//!
//! - **Data source**: the menu/extension snapshot could not be read. Fatal.
//! - **Plugin record**: one plugin-supplied record was malformed. The
//!   aggregator logs and skips it; it never aborts a generation.
//! - **Persistence**: `sitemap.xml` or the cron state could not be written or
//!   deleted. Fatal.
//! - **Configuration**: invalid settings, unreadable config files, bad regex
//!   post-processing patterns.
//! - **Access**: a cron override key did not match.
//!
//! The pipeline never retries. Retry policy belongs to whatever schedules it:
//!
//! ```rust
//! use sitemapper_core::Error;
//!
//! let err = Error::DataSourceUnavailable("snapshot missing".to_string());
//! assert_eq!(err.category(), "data_source");
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

/// The main error type for sitemapper-core operations.
///
/// All fallible public functions return `Result<T, Error>`. `Display` gives a
/// user-facing message; the source chain is preserved for I/O errors.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed outside of sitemap persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The menu or extension data could not be loaded.
    ///
    /// Aborts the generation. Typical causes are a missing or unreadable site
    /// snapshot, or a repository implementation reporting a backend failure.
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// A plugin returned a record that cannot be normalized.
    ///
    /// Only that record is dropped; the rest of the generation continues.
    #[error("Invalid record from plugin '{plugin}': {reason}")]
    PluginRecordInvalid {
        /// Name of the plugin that produced the record.
        plugin: String,
        /// Why the record was rejected.
        reason: String,
    },

    /// `sitemap.xml` or scheduler state could not be written or removed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in `sitemapper.toml`
    /// - Unknown change frequency or out-of-range priority defaults
    /// - Regex post-processing patterns that fail to compile
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content could not be parsed (sitemap XML, dates, frequencies).
    #[error("Parse error: {0}")]
    Parse(String),

    /// The site root URL or a derived location is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An access key did not match the configured key.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might succeed when the caller tries again later.
    ///
    /// Only transient I/O conditions qualify. Everything else needs a change
    /// to data or configuration first.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Used for structured logging and for mapping to CLI exit codes.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::DataSourceUnavailable(_) => "data_source",
            Self::PluginRecordInvalid { .. } => "plugin_record",
            Self::Persistence(_) => "persistence",
            Self::Config(_) => "config",
            Self::Parse(_) => "parse",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Serialization(_) => "serialization",
            Self::AccessDenied(_) => "access_denied",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Whether the error aborts a generation run.
    ///
    /// Plugin record errors are the only non-fatal kind.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::PluginRecordInvalid { .. })
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::disallowed_macros,
    clippy::unwrap_used,
    clippy::unnecessary_wraps
)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        // Given: Different error variants
        let cases = vec![
            (
                Error::DataSourceUnavailable("snapshot gone".to_string()),
                "Data source unavailable",
            ),
            (Error::Persistence("disk full".to_string()), "Persistence error"),
            (Error::Config("bad field".to_string()), "Configuration error"),
            (Error::Parse("bad xml".to_string()), "Parse error"),
            (Error::InvalidUrl("nope".to_string()), "Invalid URL"),
            (Error::AccessDenied("wrong key".to_string()), "Access denied"),
        ];

        for (error, prefix) in cases {
            // When: Converting to string
            let rendered = error.to_string();

            // Then: The category prefix is present
            assert!(rendered.starts_with(prefix), "{rendered}");
        }
    }

    #[test]
    fn test_plugin_record_error_names_plugin() {
        let err = Error::PluginRecordInvalid {
            plugin: "articles".to_string(),
            reason: "priority 3.0 out of range".to_string(),
        };

        let rendered = err.to_string();
        assert!(rendered.contains("'articles'"));
        assert!(rendered.contains("out of range"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::Io(io::Error::other("x")).category(), "io");
        assert_eq!(
            Error::DataSourceUnavailable(String::new()).category(),
            "data_source"
        );
        assert_eq!(Error::Persistence(String::new()).category(), "persistence");
        assert_eq!(Error::AccessDenied(String::new()).category(), "access_denied");
        assert_eq!(Error::NotFound(String::new()).category(), "not_found");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "t")).is_recoverable());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "i")).is_recoverable());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::NotFound, "n")).is_recoverable());
        assert!(!Error::DataSourceUnavailable("x".into()).is_recoverable());
        assert!(!Error::Persistence("x".into()).is_recoverable());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(Error::DataSourceUnavailable("x".into()).is_fatal());
        assert!(Error::Persistence("x".into()).is_fatal());
    }

    #[test]
    fn test_serde_json_conversion() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.category(), "serialization");
    }

    proptest! {
        #[test]
        fn test_persistence_error_with_arbitrary_messages(msg in r".{0,200}") {
            let err = Error::Persistence(msg.clone());
            prop_assert!(err.to_string().contains(&msg));
        }
    }
}

//! # Output Formatting
//!
//! Every command result can be printed for humans or for scripts:
//!
//! - **Text**: colored summaries, with URL listings for debug generations
//! - **JSON**: one pretty-printed object on stdout
//!
//! ```bash
//! sitemapper generate --debug --json | jq '.excludes[].exclude'
//! ```
//!
//! Text goes to stdout; logs always go to stderr so JSON stays parseable.

mod json;
mod text;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

pub use json::{DeleteOutput, GenerateOutput, print_json};
pub use text::TextFormatter;

/// Output format for CLI results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable formatted text.
    #[default]
    Text,
    /// JSON for machine consumption.
    Json,
}

impl OutputFormat {
    /// Check if this format is machine-readable.
    #[must_use]
    pub const fn is_machine_readable(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Shared output format arguments, flattened into each command.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputArgs {
    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    pub json: bool,
}

impl OutputArgs {
    /// Resolve the effective format. Text unless JSON was requested.
    #[must_use]
    pub fn resolve(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(OutputArgs::default().resolve(), OutputFormat::Text);

        let args = OutputArgs {
            format: Some(OutputFormat::Json),
            json: false,
        };
        assert_eq!(args.resolve(), OutputFormat::Json);

        let args = OutputArgs {
            format: None,
            json: true,
        };
        assert_eq!(args.resolve(), OutputFormat::Json);
        assert!(args.resolve().is_machine_readable());
    }

    #[test]
    fn test_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}

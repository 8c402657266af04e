//! Interval gate for triggered regeneration.
//!
//! A trigger (cron job, web hook, CLI) asks [`Schedule::decide`] whether a
//! generation should happen now. The answer depends on the last recorded run,
//! the configured interval and an optional override key.

use crate::config::CronConfig;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Unit of the regeneration interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Weeks.
    Week,
    /// Calendar months.
    Month,
}

/// Regeneration interval, `count` × `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Number of units.
    pub count: u32,
    /// Unit.
    pub unit: IntervalUnit,
}

impl Interval {
    /// First instant after `last_run` at which a new run is allowed.
    #[must_use]
    pub fn next_after(&self, last_run: DateTime<Utc>) -> DateTime<Utc> {
        let count = i64::from(self.count);
        let next = match self.unit {
            IntervalUnit::Minute => last_run.checked_add_signed(Duration::minutes(count)),
            IntervalUnit::Hour => last_run.checked_add_signed(Duration::hours(count)),
            IntervalUnit::Day => last_run.checked_add_signed(Duration::days(count)),
            IntervalUnit::Week => last_run.checked_add_signed(Duration::weeks(count)),
            IntervalUnit::Month => last_run.checked_add_months(Months::new(self.count)),
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Why a trigger decided to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    /// No run has ever been recorded.
    FirstRun,
    /// The interval has elapsed.
    Due,
    /// A matching override key was supplied.
    KeyOverride,
}

/// Outcome of [`Schedule::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Generate now.
    Run(TriggerReason),
    /// Too early; the next run is allowed at `next_due`.
    Skip {
        /// Earliest allowed run.
        next_due: DateTime<Utc>,
    },
}

/// Interval and key policy for scheduled regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    interval: Interval,
    key: Option<String>,
}

impl Schedule {
    /// Build the schedule from configuration. The key only counts when
    /// `key_enabled` is set and the key is non-empty.
    #[must_use]
    pub fn from_config(config: &CronConfig) -> Self {
        let key = if config.key_enabled {
            config.key.clone().filter(|k| !k.is_empty())
        } else {
            None
        };
        Self {
            interval: Interval {
                count: config.interval_count.max(1),
                unit: config.interval_unit,
            },
            key,
        }
    }

    /// The configured interval.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Decide whether to generate at `now`.
    ///
    /// A supplied key must match the configured one; a mismatch (or a key
    /// supplied while keys are disabled) is rejected rather than ignored.
    pub fn decide(
        &self,
        last_run: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        provided_key: Option<&str>,
    ) -> Result<TriggerDecision> {
        if let Some(provided) = provided_key {
            return match &self.key {
                Some(expected) if expected == provided => {
                    Ok(TriggerDecision::Run(TriggerReason::KeyOverride))
                },
                Some(_) => Err(Error::AccessDenied("cron key does not match".into())),
                None => Err(Error::AccessDenied(
                    "cron key supplied but keys are disabled".into(),
                )),
            };
        }

        let Some(last_run) = last_run else {
            return Ok(TriggerDecision::Run(TriggerReason::FirstRun));
        };

        let next_due = self.interval.next_after(last_run);
        if now >= next_due {
            Ok(TriggerDecision::Run(TriggerReason::Due))
        } else {
            Ok(TriggerDecision::Skip { next_due })
        }
    }
}

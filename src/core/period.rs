//! Period derivation - the single place where "today" and "this week" are decided.
//!
//! Periods are UTC calendar days (daily cadence) or ISO weeks starting on Monday
//! (weekly cadence). Owner-local time zones are deliberately not considered: a
//! completion at 23:59:59Z and one at 00:00:01Z the next day land in different
//! daily periods regardless of where the owner lives.

use crate::errors::{Error, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a habit is meant to be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Once per UTC calendar day
    Daily,
    /// Once per ISO week (Monday through Sunday, UTC)
    Weekly,
}

impl Cadence {
    /// The lowercase form stored in the `habits.cadence` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    const fn days_per_period(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(Error::validation(format!(
                "Unknown cadence '{other}', expected 'daily' or 'weekly'"
            ))),
        }
    }
}

/// A calendar period identified by its cadence and first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    cadence: Cadence,
    start: NaiveDate,
}

impl PeriodKey {
    /// Builds the period containing `date`.
    #[must_use]
    pub fn containing(cadence: Cadence, date: NaiveDate) -> Self {
        let start = match cadence {
            Cadence::Daily => date,
            Cadence::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
        };
        Self { cadence, start }
    }

    /// Cadence the period was derived for.
    #[must_use]
    pub const fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// First day of the period; this is the value stored in the ledger.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// The period immediately after this one.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self {
            cadence: self.cadence,
            start: self.start + Duration::days(self.cadence.days_per_period()),
        }
    }

    /// The period immediately before this one.
    #[must_use]
    pub fn predecessor(&self) -> Self {
        Self {
            cadence: self.cadence,
            start: self.start - Duration::days(self.cadence.days_per_period()),
        }
    }

    /// Number of whole periods from `self` forward to `later` (negative if `later` is earlier).
    #[must_use]
    pub fn periods_until(&self, later: &Self) -> i64 {
        (later.start - self.start).num_days() / self.cadence.days_per_period()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cadence {
            Cadence::Daily => write!(f, "{}", self.start.format("%Y-%m-%d")),
            Cadence::Weekly => {
                let week = self.start.iso_week();
                write!(f, "{}-W{:02}", week.year(), week.week())
            }
        }
    }
}

/// Maps a timestamp to the period it falls in for the given cadence.
#[must_use]
pub fn period_of(cadence: Cadence, timestamp: DateTime<Utc>) -> PeriodKey {
    PeriodKey::containing(cadence, timestamp.date_naive())
}

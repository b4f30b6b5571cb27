//! Unified error types for the habit ledger.
//!
//! Domain outcomes (validation, not-found, duplicate completion) get their own
//! variants so callers can tell a no-op click apart from a real failure.
//! Store and environment faults are wrapped and passed through untouched.

use chrono::NaiveDate;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input: empty title, unknown cadence, negative XP...
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The habit does not exist, is inactive, or belongs to another owner.
    #[error("Habit not found: {habit_id}")]
    HabitNotFound {
        /// Requested habit id
        habit_id: i64,
    },

    /// A completion for this habit is already recorded in the period.
    #[error("Habit {habit_id} already completed for period starting {period}")]
    AlreadyCompleted {
        /// Habit that was completed
        habit_id: i64,
        /// Start date of the period
        period: NaiveDate,
    },

    /// The store rejected the write because a concurrent request won.
    #[error("Concurrent completion of habit {habit_id} for period starting {period}")]
    Conflict {
        /// Habit that was completed
        habit_id: i64,
        /// Start date of the period
        period: NaiveDate,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Details about the failure
        message: String,
    },

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Integer did not fit the target type.
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Creates a validation error from anything string-like.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True when the request was a duplicate for its period, whether caught by
    /// the ledger's own check or by the store's unique index.
    #[must_use]
    pub const fn is_already_completed(&self) -> bool {
        matches!(self, Self::AlreadyCompleted { .. } | Self::Conflict { .. })
    }

    /// Short text suitable for showing to the owner.
    ///
    /// Duplicate completions read as information, not as a failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyCompleted { .. } | Self::Conflict { .. } => {
                "Already completed for this period. Come back next time!".to_string()
            }
            Self::Validation { message } => message.clone(),
            Self::HabitNotFound { .. } => "That habit could not be found.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

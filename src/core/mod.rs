//! Core layer - storage-backed habit, ledger and progress operations
//!
//! Everything here takes a `DatabaseConnection` and plain values, so any front
//! end (CLI, HTTP, chat) can drive it.

/// Streak and XP rules for a single completion
pub mod accountant;
/// Habit registry: create, list, update and deactivate habits
pub mod habit;
/// Completion ledger: at most one completion per habit per period
pub mod ledger;
/// Level ladder over total XP
pub mod leveling;
/// Calendar periods (UTC days and ISO weeks)
pub mod period;
/// Per-owner XP totals, levels and leaderboard
pub mod progress;
/// Live streaks and missed periods
pub mod stats;

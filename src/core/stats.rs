//! Streak statistics and missed-period detection.
//!
//! Stored streaks only change when a completion is recorded, so a habit that was
//! abandoned a week ago still carries its old `current_streak`. The functions
//! here look at the calendar to tell which streaks are still alive.

use crate::{
    core::{
        accountant,
        habit::list_active_habits,
        period::{PeriodKey, period_of},
    },
    entities::habit,
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Aggregate streak figures for one owner's active habits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    /// Number of active habits
    pub active_habits: usize,
    /// Active habits whose streak is still alive
    pub habits_with_streak: usize,
    /// Sum of all live streaks
    pub total_active_streaks: u64,
    /// Highest best streak among active habits
    pub longest_streak: u32,
}

/// An active habit whose streak has lapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedHabit {
    /// Habit id
    pub habit_id: i64,
    /// Habit title
    pub title: String,
    /// Start of the last period with a completion
    pub last_completed_period: NaiveDate,
    /// Whole periods skipped since then, not counting the current one
    pub periods_missed: i64,
    /// Streak value that will be lost on the next completion
    pub frozen_streak: u32,
}

/// The streak as of `now`: the stored value while the last completion is in the
/// current or previous period, otherwise 0.
pub fn effective_streak(habit: &habit::Model, now: DateTime<Utc>) -> Result<u32> {
    let (cadence, _) = accountant::habit_terms(habit)?;
    let current = period_of(cadence, now);

    Ok(match habit.last_completed_period {
        Some(last) => {
            let last = PeriodKey::containing(cadence, last);
            if last == current || last == current.predecessor() {
                habit.current_streak
            } else {
                0
            }
        }
        None => 0,
    })
}

/// Summarises the owner's active habits as of `now`.
pub async fn streak_summary(
    db: &DatabaseConnection,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<StreakSummary> {
    let habits = list_active_habits(db, owner_id).await?;
    let mut summary = StreakSummary {
        active_habits: habits.len(),
        ..StreakSummary::default()
    };

    for habit in &habits {
        let streak = effective_streak(habit, now)?;
        if streak > 0 {
            summary.habits_with_streak += 1;
            summary.total_active_streaks += u64::from(streak);
        }
        summary.longest_streak = summary.longest_streak.max(habit.best_streak);
    }

    Ok(summary)
}

/// Active habits that skipped at least one whole period before the current one.
///
/// Habits never completed are not listed; they have no streak to lose.
pub async fn missed_habits(
    db: &DatabaseConnection,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<MissedHabit>> {
    let habits = list_active_habits(db, owner_id).await?;
    let mut missed = Vec::new();

    for habit in habits {
        let Some(last) = habit.last_completed_period else {
            continue;
        };
        let (cadence, _) = accountant::habit_terms(&habit)?;
        let last_period = PeriodKey::containing(cadence, last);
        let elapsed = last_period.periods_until(&period_of(cadence, now));

        if elapsed >= 2 {
            missed.push(MissedHabit {
                habit_id: habit.id,
                title: habit.title,
                last_completed_period: last,
                periods_missed: elapsed - 1,
                frozen_streak: habit.current_streak,
            });
        }
    }

    Ok(missed)
}

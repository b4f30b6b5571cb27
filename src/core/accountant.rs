//! Streak and XP accounting.
//!
//! Pure functions from the prior habit state and the period being completed to
//! the new streak counters and the XP award. Nothing here touches the database;
//! the ledger calls these inside its transaction and persists the result.

use crate::{
    core::period::{Cadence, PeriodKey},
    entities::habit,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier of a habit; decides the XP per completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// 10 XP per completion
    Easy,
    /// 25 XP per completion
    Medium,
    /// 50 XP per completion
    Hard,
}

impl Difficulty {
    /// The lowercase form stored in the `habits.difficulty` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(Error::validation(format!(
                "Unknown difficulty '{other}', expected 'easy', 'medium' or 'hard'"
            ))),
        }
    }
}

/// How a completion after a missed period affects the streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakPolicy {
    /// A gap of one or more periods restarts the streak at 1.
    #[default]
    ResetOnGap,
    /// Every completion adds 1 no matter how long the gap was.
    ///
    /// Matches what the earlier web client did; kept for compatibility testing.
    AlwaysIncrement,
}

/// New streak counters produced by a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    /// Streak after this completion
    pub new_current_streak: u32,
    /// Best streak after this completion, never below `new_current_streak`
    pub new_best_streak: u32,
}

/// Computes the streak counters after completing `habit` in `period`.
///
/// Under [`StreakPolicy::ResetOnGap`] the streak grows only when `period` directly
/// follows the habit's last completed period; a first completion or a gap yields 1.
#[must_use]
pub fn compute_streak_update(
    habit: &habit::Model,
    period: &PeriodKey,
    policy: StreakPolicy,
) -> StreakUpdate {
    let new_current_streak = match policy {
        StreakPolicy::AlwaysIncrement => habit.current_streak.saturating_add(1),
        StreakPolicy::ResetOnGap => {
            let continues = habit.last_completed_period.is_some_and(|last| {
                PeriodKey::containing(period.cadence(), last).successor() == *period
            });
            if continues {
                habit.current_streak.saturating_add(1)
            } else {
                1
            }
        }
    };

    StreakUpdate {
        new_current_streak,
        new_best_streak: habit.best_streak.max(new_current_streak),
    }
}

/// XP granted for one completion. Depends on difficulty alone.
#[must_use]
pub const fn compute_xp_award(difficulty: Difficulty) -> i64 {
    match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 25,
        Difficulty::Hard => 50,
    }
}

/// Streak lengths that earn a one-off bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreakMilestone {
    /// 7 consecutive periods
    Weekly,
    /// 30 consecutive periods
    Monthly,
    /// 100 consecutive periods
    Century,
    /// 365 consecutive periods
    Yearly,
}

impl StreakMilestone {
    /// Bonus XP for reaching the milestone.
    #[must_use]
    pub const fn bonus_xp(self) -> i64 {
        match self {
            Self::Weekly => 25,
            Self::Monthly => 100,
            Self::Century => 500,
            Self::Yearly => 1000,
        }
    }

    /// Reason string reported alongside the bonus.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Weekly => "weekly_streak_bonus",
            Self::Monthly => "monthly_streak_bonus",
            Self::Century => "century_streak_bonus",
            Self::Yearly => "yearly_streak_bonus",
        }
    }
}

/// Returns the milestone reached when a streak lands exactly on 7, 30, 100 or 365.
#[must_use]
pub const fn streak_milestone(streak: u32) -> Option<StreakMilestone> {
    match streak {
        7 => Some(StreakMilestone::Weekly),
        30 => Some(StreakMilestone::Monthly),
        100 => Some(StreakMilestone::Century),
        365 => Some(StreakMilestone::Yearly),
        _ => None,
    }
}

/// Parses the stored cadence and difficulty of a habit row.
///
/// Rows are only written through the registry, so a parse failure means the
/// table was edited by hand; it surfaces as a validation error.
pub fn habit_terms(habit: &habit::Model) -> Result<(Cadence, Difficulty)> {
    Ok((habit.cadence.parse()?, habit.difficulty.parse()?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_with(
        cadence: Cadence,
        current: u32,
        best: u32,
        last: Option<NaiveDate>,
    ) -> habit::Model {
        habit::Model {
            id: 1,
            owner_id: "owner".to_string(),
            title: "Gym".to_string(),
            description: String::new(),
            cadence: cadence.as_str().to_string(),
            difficulty: "medium".to_string(),
            current_streak: current,
            best_streak: best,
            total_completions: current,
            last_completed_period: last,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_completion_starts_streak() {
        let habit = habit_with(Cadence::Daily, 0, 0, None);
        let period = PeriodKey::containing(Cadence::Daily, date(2025, 1, 1));
        let update = compute_streak_update(&habit, &period, StreakPolicy::ResetOnGap);
        assert_eq!(update.new_current_streak, 1);
        assert_eq!(update.new_best_streak, 1);
    }

    #[test]
    fn test_consecutive_day_increments() {
        let habit = habit_with(Cadence::Daily, 4, 9, Some(date(2025, 1, 1)));
        let period = PeriodKey::containing(Cadence::Daily, date(2025, 1, 2));
        let update = compute_streak_update(&habit, &period, StreakPolicy::ResetOnGap);
        assert_eq!(update.new_current_streak, 5);
        assert_eq!(update.new_best_streak, 9);
    }

    #[test]
    fn test_gap_resets_streak_but_keeps_best() {
        let habit = habit_with(Cadence::Daily, 4, 4, Some(date(2025, 1, 1)));
        let period = PeriodKey::containing(Cadence::Daily, date(2025, 1, 3));
        let update = compute_streak_update(&habit, &period, StreakPolicy::ResetOnGap);
        assert_eq!(update.new_current_streak, 1);
        assert_eq!(update.new_best_streak, 4);
    }

    #[test]
    fn test_always_increment_ignores_gap() {
        let habit = habit_with(Cadence::Daily, 4, 4, Some(date(2025, 1, 1)));
        let period = PeriodKey::containing(Cadence::Daily, date(2025, 1, 11));
        let update = compute_streak_update(&habit, &period, StreakPolicy::AlwaysIncrement);
        assert_eq!(update.new_current_streak, 5);
        assert_eq!(update.new_best_streak, 5);
    }

    #[test]
    fn test_weekly_successor_across_year_boundary() {
        // Week of 2024-12-23 is followed by the week of 2024-12-30 (2025-W01)
        let habit = habit_with(Cadence::Weekly, 2, 2, Some(date(2024, 12, 23)));
        let period = PeriodKey::containing(Cadence::Weekly, date(2025, 1, 2));
        let update = compute_streak_update(&habit, &period, StreakPolicy::ResetOnGap);
        assert_eq!(update.new_current_streak, 3);
        assert_eq!(update.new_best_streak, 3);

        let skipped = PeriodKey::containing(Cadence::Weekly, date(2025, 1, 8));
        let update = compute_streak_update(&habit, &skipped, StreakPolicy::ResetOnGap);
        assert_eq!(update.new_current_streak, 1);
    }

    #[test]
    fn test_best_streak_monotonic_over_sequence() {
        let mut habit = habit_with(Cadence::Daily, 0, 0, None);
        let days = [1, 2, 3, 5, 6, 10, 11, 12, 13, 14];
        let mut previous_best = 0;
        for day in days {
            let period = PeriodKey::containing(Cadence::Daily, date(2025, 3, day));
            let update = compute_streak_update(&habit, &period, StreakPolicy::ResetOnGap);
            assert!(update.new_best_streak >= previous_best);
            assert!(update.new_best_streak >= update.new_current_streak);
            previous_best = update.new_best_streak;
            habit.current_streak = update.new_current_streak;
            habit.best_streak = update.new_best_streak;
            habit.last_completed_period = Some(period.start());
        }
        assert_eq!(habit.current_streak, 5);
        assert_eq!(habit.best_streak, 5);
    }

    #[test]
    fn test_xp_award_by_difficulty() {
        for _ in 0..3 {
            assert_eq!(compute_xp_award(Difficulty::Easy), 10);
            assert_eq!(compute_xp_award(Difficulty::Medium), 25);
            assert_eq!(compute_xp_award(Difficulty::Hard), 50);
        }
    }

    #[test]
    fn test_streak_milestones() {
        assert_eq!(streak_milestone(6), None);
        assert_eq!(streak_milestone(7), Some(StreakMilestone::Weekly));
        assert_eq!(streak_milestone(30).map(StreakMilestone::bonus_xp), Some(100));
        assert_eq!(
            streak_milestone(365).map(StreakMilestone::reason),
            Some("yearly_streak_bonus")
        );
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!(matches!(
            "extreme".parse::<Difficulty>(),
            Err(Error::Validation { message: _ })
        ));
    }
}

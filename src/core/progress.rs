//! Progress book - Receives XP deltas per owner and keeps totals, levels and the leaderboard.
//!
//! The ledger only reports how much XP a completion earned; this module is the
//! receiving side. It never touches identity or profile data, just the
//! `progress` table keyed by owner id. XP totals are increased with a single
//! `UPDATE ... SET total_xp = total_xp + ?` so concurrent awards cannot lose updates.

use crate::{
    core::{
        accountant::{self, StreakMilestone, StreakPolicy},
        leveling::{self, LevelProgress, LevelRewards, LevelUp},
        ledger::{self, CompletionOutcome},
    },
    entities::{Progress, progress},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::{info, instrument};

/// Reason reported for the XP of an ordinary completion.
pub const HABIT_COMPLETE_REASON: &str = "habit_complete";

/// Outcome of reporting an XP delta.
#[derive(Debug, Clone, Serialize)]
pub struct XpAward {
    /// Owner the XP was credited to
    pub owner_id: String,
    /// XP added by this award
    pub amount: i64,
    /// Why the XP was granted (e.g., `"habit_complete"`)
    pub reason: String,
    /// Total XP before the award
    pub old_total: i64,
    /// Total XP after the award
    pub new_total: i64,
    /// Level change caused by the award
    pub level_up: LevelUp,
    /// Progress within the new level
    pub progress: LevelProgress,
    /// Rewards of every level crossed that grants something; bonus XP is not credited
    pub rewards: Vec<LevelRewards>,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: u64,
    /// Owner id
    pub owner_id: String,
    /// Total XP
    pub total_xp: i64,
    /// Level for `total_xp`
    pub level: u32,
}

/// Bonus granted because a streak reached a milestone length.
#[derive(Debug, Clone)]
pub struct MilestoneAward {
    /// Which milestone was reached
    pub milestone: StreakMilestone,
    /// The bonus as credited
    pub award: XpAward,
}

/// A completion together with the XP it produced.
#[derive(Debug, Clone)]
pub struct HabitCompletion {
    /// What the ledger recorded
    pub outcome: CompletionOutcome,
    /// XP credited for the completion itself
    pub xp: XpAward,
    /// Extra XP when the new streak hit a milestone
    pub milestone: Option<MilestoneAward>,
}

/// Credits `amount` XP to an owner and recomputes their level.
///
/// Creates the owner's progress row on first use. `amount` must not be negative.
#[instrument(skip(db))]
pub async fn award_xp(
    db: &DatabaseConnection,
    owner_id: &str,
    amount: i64,
    reason: &str,
) -> Result<XpAward> {
    if amount < 0 {
        return Err(Error::validation(format!(
            "XP award must not be negative, got {amount}"
        )));
    }
    if owner_id.trim().is_empty() {
        return Err(Error::validation("Owner id cannot be empty"));
    }

    let txn = db.begin().await?;
    let now = Utc::now();

    if Progress::find_by_id(owner_id.to_string())
        .one(&txn)
        .await?
        .is_none()
    {
        progress::ActiveModel {
            owner_id: Set(owner_id.to_string()),
            total_xp: Set(0),
            level: Set(1),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    Progress::update_many()
        .col_expr(
            progress::Column::TotalXp,
            Expr::col(progress::Column::TotalXp).add(amount),
        )
        .col_expr(progress::Column::UpdatedAt, Expr::value(now))
        .filter(progress::Column::OwnerId.eq(owner_id))
        .exec(&txn)
        .await?;

    let updated = Progress::find_by_id(owner_id.to_string())
        .one(&txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("progress for owner {owner_id}")))?;

    let new_total = updated.total_xp;
    let old_total = new_total - amount;
    let level_up = leveling::check_level_up(old_total, new_total);

    if updated.level != level_up.new_level {
        let mut active_model: progress::ActiveModel = updated.into();
        active_model.level = Set(level_up.new_level);
        active_model.update(&txn).await?;
    }

    txn.commit().await?;

    if level_up.leveled_up {
        info!(
            "Owner {} reached level {} ({} XP)",
            owner_id, level_up.new_level, new_total
        );
    }

    let rewards = level_up
        .levels_crossed
        .iter()
        .map(|level| leveling::level_rewards(*level))
        .filter(|rewards| !rewards.is_empty())
        .collect();

    Ok(XpAward {
        owner_id: owner_id.to_string(),
        amount,
        reason: reason.to_string(),
        old_total,
        new_total,
        level_up,
        progress: leveling::progress_from_xp(new_total),
        rewards,
    })
}

/// Retrieves an owner's progress, or `None` if no XP was ever reported for them.
pub async fn get_progress(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Option<progress::Model>> {
    Progress::find_by_id(owner_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Top owners by total XP; ties are broken by owner id.
pub async fn leaderboard(db: &DatabaseConnection, limit: u64) -> Result<Vec<LeaderboardEntry>> {
    let rows = Progress::find()
        .order_by_desc(progress::Column::TotalXp)
        .order_by_asc(progress::Column::OwnerId)
        .limit(limit)
        .all(db)
        .await?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<LeaderboardEntry> {
            Ok(LeaderboardEntry {
                rank: u64::try_from(index)? + 1,
                owner_id: row.owner_id,
                total_xp: row.total_xp,
                level: row.level,
            })
        })
        .collect()
}

/// Records a completion and credits the XP it earned.
///
/// The ledger write commits first; XP is only reported for a completion that
/// was actually recorded, so duplicates never earn anything. A streak landing on
/// a milestone length earns its bonus as a separate award.
#[instrument(skip(db, notes))]
pub async fn complete_habit(
    db: &DatabaseConnection,
    habit_id: i64,
    owner_id: &str,
    now: DateTime<Utc>,
    notes: Option<String>,
    policy: StreakPolicy,
) -> Result<HabitCompletion> {
    let outcome = ledger::record_completion(db, habit_id, owner_id, now, notes, policy).await?;

    let xp = award_xp(db, owner_id, outcome.xp_awarded, HABIT_COMPLETE_REASON).await?;

    let milestone = match accountant::streak_milestone(outcome.streak.new_current_streak) {
        Some(milestone) => {
            let award = award_xp(db, owner_id, milestone.bonus_xp(), milestone.reason()).await?;
            info!(
                "Habit {} hit a {:?} streak milestone for owner {}",
                habit_id, milestone, owner_id
            );
            Some(MilestoneAward { milestone, award })
        }
        None => None,
    };

    Ok(HabitCompletion {
        outcome,
        xp,
        milestone,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_award_xp_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = award_xp(&db, OWNER, -5, "oops").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = award_xp(&db, "  ", 5, "habit_complete").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_award_xp_creates_and_accumulates() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(get_progress(&db, OWNER).await?.is_none());

        let first = award_xp(&db, OWNER, 150, HABIT_COMPLETE_REASON).await?;
        assert_eq!(first.old_total, 0);
        assert_eq!(first.new_total, 150);
        assert!(!first.level_up.leveled_up);

        let second = award_xp(&db, OWNER, 300, HABIT_COMPLETE_REASON).await?;
        assert_eq!(second.old_total, 150);
        assert_eq!(second.new_total, 450);
        assert!(second.level_up.leveled_up);
        assert_eq!(second.level_up.levels_crossed, vec![2, 3]);
        assert_eq!(second.progress.current_level, 3);
        assert!(second.rewards.is_empty());

        let stored = get_progress(&db, OWNER).await?.unwrap();
        assert_eq!(stored.total_xp, 450);
        assert_eq!(stored.level, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_award_xp_lists_rewards_of_crossed_levels() -> Result<()> {
        let db = setup_test_db().await?;

        // 0 -> 1300 XP crosses levels 2 to 5; only level 5 grants anything
        let award = award_xp(&db, OWNER, 1300, HABIT_COMPLETE_REASON).await?;
        assert_eq!(award.level_up.levels_crossed, vec![2, 3, 4, 5]);
        assert_eq!(award.rewards.len(), 1);
        assert_eq!(award.rewards[0].level, 5);
        assert_eq!(award.rewards[0].xp_bonus, 50);
        assert_eq!(award.rewards[0].badge.as_deref(), Some("Level 5 Master"));

        // The bonus is reported only
        let stored = get_progress(&db, OWNER).await?.unwrap();
        assert_eq!(stored.total_xp, 1300);

        Ok(())
    }

    #[tokio::test]
    async fn test_leaderboard_order_and_limit() -> Result<()> {
        let db = setup_test_db().await?;

        award_xp(&db, "carol", 500, HABIT_COMPLETE_REASON).await?;
        award_xp(&db, "alice", 900, HABIT_COMPLETE_REASON).await?;
        award_xp(&db, "bob", 500, HABIT_COMPLETE_REASON).await?;
        award_xp(&db, "dave", 10, HABIT_COMPLETE_REASON).await?;

        let board = leaderboard(&db, 3).await?;
        assert_eq!(board.len(), 3);
        assert_eq!(board[0].owner_id, "alice");
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[0].level, 4);
        assert_eq!(board[1].owner_id, "bob");
        assert_eq!(board[2].owner_id, "carol");
        assert_eq!(board[2].rank, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_habit_reports_xp_once() -> Result<()> {
        let (db, habit) = setup_with_habit().await?;
        let policy = StreakPolicy::ResetOnGap;

        let done = complete_habit(&db, habit.id, OWNER, at(2025, 1, 1, 8, 0, 0), None, policy)
            .await?;
        assert_eq!(done.xp.amount, 25);
        assert_eq!(done.xp.reason, HABIT_COMPLETE_REASON);
        assert!(done.milestone.is_none());

        let again =
            complete_habit(&db, habit.id, OWNER, at(2025, 1, 1, 9, 0, 0), None, policy).await;
        assert!(again.unwrap_err().is_already_completed());

        let stored = get_progress(&db, OWNER).await?.unwrap();
        assert_eq!(stored.total_xp, 25);

        Ok(())
    }

    #[tokio::test]
    async fn test_complete_habit_weekly_streak_milestone() -> Result<()> {
        let (db, habit) = setup_with_habit().await?;
        let policy = StreakPolicy::ResetOnGap;

        let mut last = None;
        for day in 1..=7 {
            last = Some(
                complete_habit(&db, habit.id, OWNER, at(2025, 1, day, 8, 0, 0), None, policy)
                    .await?,
            );
        }

        let last = last.unwrap();
        assert_eq!(last.outcome.habit.current_streak, 7);
        let milestone = last.milestone.unwrap();
        assert_eq!(milestone.milestone, StreakMilestone::Weekly);
        assert_eq!(milestone.award.amount, 25);
        assert_eq!(milestone.award.reason, "weekly_streak_bonus");

        // 7 completions at 25 XP plus the 25 XP bonus
        let stored = get_progress(&db, OWNER).await?.unwrap();
        assert_eq!(stored.total_xp, 7 * 25 + 25);
        assert_eq!(stored.level, 2);

        Ok(())
    }
}

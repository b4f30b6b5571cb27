//! Completion ledger - Records habit completions, at most one per habit per period.
//!
//! `record_completion` is the only writer of streak fields. It runs inside a
//! single database transaction: the completion row, the new streak counters and
//! the habit's `last_completed_period` are committed together or not at all.
//!
//! Duplicate protection is layered. The cached `last_completed_period` and a
//! lookup in the completions table turn away ordinary repeat clicks cheaply. The
//! unique index over (`habit_id`, `period`) is what actually guarantees one row per
//! period when two requests race, and the habit update is guarded on the
//! previously read period so a late writer cannot bump the streak twice.

use crate::{
    core::{
        accountant::{self, StreakPolicy, StreakUpdate},
        period::{PeriodKey, period_of},
    },
    entities::{Completion, Habit, completion, habit},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Everything a successful completion produced.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// The stored completion event
    pub completion: completion::Model,
    /// The habit as committed, with updated streak fields
    pub habit: habit::Model,
    /// Period the completion counts for
    pub period: PeriodKey,
    /// Streak counters computed for this completion
    pub streak: StreakUpdate,
    /// XP earned by this completion, to be reported to the XP accounting side
    pub xp_awarded: i64,
}

/// Records that the owner completed a habit at `now`.
///
/// # Errors
/// * `Error::HabitNotFound` - missing, inactive, or owned by someone else
/// * `Error::AlreadyCompleted` - a completion already exists for the period
/// * `Error::Conflict` - a concurrent request recorded the period first
/// * `Error::Validation` - `now` lies in a period before the last completed one
#[instrument(skip(db, notes))]
pub async fn record_completion(
    db: &DatabaseConnection,
    habit_id: i64,
    owner_id: &str,
    now: DateTime<Utc>,
    notes: Option<String>,
    policy: StreakPolicy,
) -> Result<CompletionOutcome> {
    let txn = db.begin().await?;

    let habit = Habit::find_by_id(habit_id)
        .filter(habit::Column::OwnerId.eq(owner_id))
        .filter(habit::Column::Active.eq(true))
        .one(&txn)
        .await?
        .ok_or(Error::HabitNotFound { habit_id })?;

    let (cadence, difficulty) = accountant::habit_terms(&habit)?;
    let period = period_of(cadence, now);

    if let Some(last) = habit.last_completed_period {
        if last == period.start() {
            debug!("Habit {} already completed for {}", habit_id, period);
            return Err(Error::AlreadyCompleted {
                habit_id,
                period: last,
            });
        }
        if period.start() < last {
            return Err(Error::validation(format!(
                "Completion for {period} is earlier than the last completed period"
            )));
        }
    }

    if completion_exists(&txn, habit_id, period.start()).await? {
        warn!(
            "Habit {} has a completion for {} that its cached period missed",
            habit_id, period
        );
        return Err(Error::AlreadyCompleted {
            habit_id,
            period: period.start(),
        });
    }

    let streak = accountant::compute_streak_update(&habit, &period, policy);
    let xp_awarded = accountant::compute_xp_award(difficulty);

    let completion = insert_completion(
        &txn,
        NewCompletion {
            habit_id,
            owner_id: owner_id.to_string(),
            period: period.start(),
            occurred_at: now,
            xp_awarded,
            notes,
        },
    )
    .await?;

    // Only advance the habit if nobody else moved its period since we read it
    let unchanged = match habit.last_completed_period {
        Some(previous) => habit::Column::LastCompletedPeriod.eq(previous),
        None => habit::Column::LastCompletedPeriod.is_null(),
    };
    let update = Habit::update_many()
        .set(habit::ActiveModel {
            current_streak: Set(streak.new_current_streak),
            best_streak: Set(streak.new_best_streak),
            total_completions: Set(habit.total_completions.saturating_add(1)),
            last_completed_period: Set(Some(period.start())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(habit::Column::Id.eq(habit_id))
        .filter(unchanged)
        .exec(&txn)
        .await?;

    if update.rows_affected == 0 {
        return Err(Error::Conflict {
            habit_id,
            period: period.start(),
        });
    }

    let habit = Habit::find_by_id(habit_id)
        .one(&txn)
        .await?
        .ok_or(Error::HabitNotFound { habit_id })?;

    txn.commit().await?;

    info!(
        "Recorded completion {} of habit {} for {}: streak={}, best={}, xp={}",
        completion.id,
        habit_id,
        period,
        streak.new_current_streak,
        streak.new_best_streak,
        xp_awarded
    );

    Ok(CompletionOutcome {
        completion,
        habit,
        period,
        streak,
        xp_awarded,
    })
}

/// Checks whether a completion exists for the habit in the period starting at `period`.
pub async fn completion_exists<C>(db: &C, habit_id: i64, period: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = Completion::find()
        .filter(completion::Column::HabitId.eq(habit_id))
        .filter(completion::Column::Period.eq(period))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Retrieves the owner's completions of a habit, newest period first.
pub async fn get_completions_for_habit(
    db: &DatabaseConnection,
    habit_id: i64,
    owner_id: &str,
) -> Result<Vec<completion::Model>> {
    Completion::find()
        .filter(completion::Column::HabitId.eq(habit_id))
        .filter(completion::Column::OwnerId.eq(owner_id))
        .order_by_desc(completion::Column::Period)
        .order_by_desc(completion::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Fields of a completion row about to be written.
#[derive(Debug, Clone)]
pub(crate) struct NewCompletion {
    pub(crate) habit_id: i64,
    pub(crate) owner_id: String,
    pub(crate) period: NaiveDate,
    pub(crate) occurred_at: DateTime<Utc>,
    pub(crate) xp_awarded: i64,
    pub(crate) notes: Option<String>,
}

/// Inserts a completion row, turning a unique index violation into `Error::Conflict`.
pub(crate) async fn insert_completion<C>(db: &C, new: NewCompletion) -> Result<completion::Model>
where
    C: ConnectionTrait,
{
    let NewCompletion {
        habit_id,
        owner_id,
        period,
        occurred_at,
        xp_awarded,
        notes,
    } = new;

    let model = completion::ActiveModel {
        habit_id: Set(habit_id),
        owner_id: Set(owner_id),
        period: Set(period),
        occurred_at: Set(occurred_at),
        xp_awarded: Set(xp_awarded),
        notes: Set(notes),
        ..Default::default()
    };

    model.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            warn!("Lost completion race for habit {} in {}", habit_id, period);
            Error::Conflict { habit_id, period }
        }
        _ => Error::Database(err),
    })
}

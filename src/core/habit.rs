//! Habit registry - Handles habit creation, lookup and soft deletion.
//!
//! Every operation is scoped to an owner id: an owner can never see or change
//! another owner's habits, and a habit that belongs to someone else reports as
//! not found. Habits are never deleted, only deactivated. Streak counters are
//! not touched here; they belong to the completion ledger.

use crate::{
    core::{accountant::Difficulty, period::Cadence},
    entities::{Habit, habit},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Creates a new active habit for `owner_id` with zeroed streaks.
///
/// The title is trimmed. Fails with `Error::Validation` when the title or owner
/// id is empty, or when the owner already has an active habit with the same title.
#[instrument(skip(db, description))]
pub async fn create_habit(
    db: &DatabaseConnection,
    owner_id: String,
    title: String,
    description: String,
    cadence: Cadence,
    difficulty: Difficulty,
) -> Result<habit::Model> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(Error::validation("Habit title cannot be empty"));
    }
    if owner_id.trim().is_empty() {
        return Err(Error::validation("Owner id cannot be empty"));
    }

    let txn = db.begin().await?;

    if find_active_by_title(&txn, &owner_id, &title, None)
        .await?
        .is_some()
    {
        return Err(Error::validation(format!(
            "You already have an active habit named '{title}'"
        )));
    }

    let now = Utc::now();
    let habit = habit::ActiveModel {
        owner_id: Set(owner_id),
        title: Set(title),
        description: Set(description.trim().to_string()),
        cadence: Set(cadence.as_str().to_string()),
        difficulty: Set(difficulty.as_str().to_string()),
        current_streak: Set(0),
        best_streak: Set(0),
        total_completions: Set(0),
        last_completed_period: Set(None),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = habit.insert(&txn).await?;
    txn.commit().await?;

    info!(
        "Created habit {} '{}' ({}, {}) for owner {}",
        result.id, result.title, result.cadence, result.difficulty, result.owner_id
    );
    Ok(result)
}

/// Finds a habit by id for its owner, including deactivated habits.
///
/// Returns `None` when the habit does not exist or belongs to someone else.
pub async fn get_habit(
    db: &DatabaseConnection,
    habit_id: i64,
    owner_id: &str,
) -> Result<Option<habit::Model>> {
    Habit::find_by_id(habit_id)
        .filter(habit::Column::OwnerId.eq(owner_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists an owner's active habits, most recently created first.
pub async fn list_active_habits(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<habit::Model>> {
    Habit::find()
        .filter(habit::Column::OwnerId.eq(owner_id))
        .filter(habit::Column::Active.eq(true))
        .order_by_desc(habit::Column::CreatedAt)
        .order_by_desc(habit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a habit. Streak values are frozen as they are.
///
/// The update is filtered on id, owner and `active = true` in one statement, so a
/// missing, foreign or already inactive habit all yield `Error::HabitNotFound`.
#[instrument(skip(db))]
pub async fn deactivate_habit(db: &DatabaseConnection, habit_id: i64, owner_id: &str) -> Result<()> {
    let result = Habit::update_many()
        .set(habit::ActiveModel {
            active: Set(false),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(habit::Column::Id.eq(habit_id))
        .filter(habit::Column::OwnerId.eq(owner_id))
        .filter(habit::Column::Active.eq(true))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::HabitNotFound { habit_id });
    }

    info!("Deactivated habit {} for owner {}", habit_id, owner_id);
    Ok(())
}

/// Changes the title and description of an active habit.
///
/// Applies the same rules as [`create_habit`]: non-empty title, no other active
/// habit of the owner with that title.
#[instrument(skip(db, description))]
pub async fn update_habit_details(
    db: &DatabaseConnection,
    habit_id: i64,
    owner_id: &str,
    title: String,
    description: String,
) -> Result<habit::Model> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(Error::validation("Habit title cannot be empty"));
    }

    let txn = db.begin().await?;

    let habit = Habit::find_by_id(habit_id)
        .filter(habit::Column::OwnerId.eq(owner_id))
        .filter(habit::Column::Active.eq(true))
        .one(&txn)
        .await?
        .ok_or(Error::HabitNotFound { habit_id })?;

    if find_active_by_title(&txn, owner_id, &title, Some(habit_id))
        .await?
        .is_some()
    {
        return Err(Error::validation(format!(
            "You already have an active habit named '{title}'"
        )));
    }

    let mut active_model: habit::ActiveModel = habit.into();
    active_model.title = Set(title);
    active_model.description = Set(description.trim().to_string());
    active_model.updated_at = Set(Utc::now());
    let updated = active_model.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

async fn find_active_by_title<C>(
    db: &C,
    owner_id: &str,
    title: &str,
    excluding: Option<i64>,
) -> Result<Option<habit::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Habit::find()
        .filter(habit::Column::OwnerId.eq(owner_id))
        .filter(habit::Column::Title.eq(title))
        .filter(habit::Column::Active.eq(true));
    if let Some(habit_id) = excluding {
        query = query.filter(habit::Column::Id.ne(habit_id));
    }
    query.one(db).await.map_err(Into::into)
}

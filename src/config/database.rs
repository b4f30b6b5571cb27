//! Database configuration module for the habit ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. The one constraint entities cannot
//! express, the composite unique index over (`habit_id`, `period`) on completions, is
//! built here with `sea_query` and is what makes duplicate completions impossible.

use crate::entities::{Completion, Habit, Progress, completion};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/habit_ledger.sqlite?mode=rwc";

/// Name of the unique index guarding one completion per habit per period.
pub const COMPLETION_PERIOD_INDEX: &str = "idx_completions_habit_period";

/// Resolves the database URL.
///
/// `DATABASE_URL` in the environment wins, then the configured value, then a
/// local `SQLite` file under `data/`.
#[must_use]
pub fn get_database_url(configured: Option<&str>) -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

/// Opens a connection pool for the given URL.
///
/// In-memory `SQLite` databases exist per connection, so they are limited to a
/// single pooled connection; every caller then sees the same tables.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_string());
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    debug!("Connecting to database");
    Database::connect(options).await.map_err(Into::into)
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Covers habits, completions and progress, plus the unique completion index.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut habit_table = schema.create_table_from_entity(Habit);
    habit_table.if_not_exists();
    let mut completion_table = schema.create_table_from_entity(Completion);
    completion_table.if_not_exists();
    let mut progress_table = schema.create_table_from_entity(Progress);
    progress_table.if_not_exists();

    db.execute(builder.build(&habit_table)).await?;
    db.execute(builder.build(&completion_table)).await?;
    db.execute(builder.build(&progress_table)).await?;

    let completion_period_index = Index::create()
        .name(COMPLETION_PERIOD_INDEX)
        .table(Completion)
        .col(completion::Column::HabitId)
        .col(completion::Column::Period)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&completion_period_index)).await?;

    info!("Database tables ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{
        completion::Model as CompletionModel, habit::Model as HabitModel,
        progress::Model as ProgressModel,
    };
    use crate::test_utils::create_test_habit;
    use chrono::{NaiveDate, Utc};
    use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, SqlErr};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<HabitModel> = Habit::find().limit(1).all(&db).await?;
        let _: Vec<CompletionModel> = Completion::find().limit(1).all(&db).await?;
        let _: Vec<ProgressModel> = Progress::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_completion_period_index_is_unique() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        let habit = create_test_habit(&db, "Gym").await?;

        let period = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let row = || completion::ActiveModel {
            habit_id: Set(habit.id),
            owner_id: Set(habit.owner_id.clone()),
            period: Set(period),
            occurred_at: Set(Utc::now()),
            xp_awarded: Set(10),
            notes: Set(None),
            ..Default::default()
        };

        row().insert(&db).await?;
        let duplicate = row().insert(&db).await.unwrap_err();
        assert!(matches!(
            duplicate.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        Ok(())
    }

    #[test]
    fn test_get_database_url_prefers_configured_value() {
        // Only meaningful when DATABASE_URL is not exported in the test environment
        if std::env::var("DATABASE_URL").is_err() {
            assert_eq!(get_database_url(Some("sqlite::memory:")), "sqlite::memory:");
            assert_eq!(get_database_url(None), DEFAULT_DATABASE_URL);
        }
    }
}

//! Shared test utilities for the habit ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test habits with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{accountant::Difficulty, habit, period::Cadence},
    entities,
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Owner id used by the default fixtures.
pub const OWNER: &str = "test_owner";

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = crate::config::database::create_connection("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database in a fresh temporary directory.
///
/// Unlike [`setup_test_db`] this keeps a regular connection pool, so concurrent
/// transactions really overlap. Keep the returned `TempDir` alive for the test.
pub async fn setup_file_db() -> Result<(TempDir, DatabaseConnection)> {
    init_test_tracing();
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("habit_ledger.sqlite").display()
    );
    let db = crate::config::database::create_connection(&url).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((dir, db))
}

/// Creates a test habit with sensible defaults.
///
/// # Defaults
/// * `owner_id`: [`OWNER`]
/// * `description`: empty
/// * `cadence`: daily
/// * `difficulty`: medium
pub async fn create_test_habit(
    db: &DatabaseConnection,
    title: &str,
) -> Result<entities::habit::Model> {
    create_custom_habit(db, OWNER, title, Cadence::Daily, Difficulty::Medium).await
}

/// Creates a test habit with custom parameters.
pub async fn create_custom_habit(
    db: &DatabaseConnection,
    owner_id: &str,
    title: &str,
    cadence: Cadence,
    difficulty: Difficulty,
) -> Result<entities::habit::Model> {
    habit::create_habit(
        db,
        owner_id.to_string(),
        title.to_string(),
        String::new(),
        cadence,
        difficulty,
    )
    .await
}

/// Sets up a complete test environment with one daily, medium habit.
/// Returns (db, habit) for common test scenarios.
pub async fn setup_with_habit() -> Result<(DatabaseConnection, entities::habit::Model)> {
    let db = setup_test_db().await?;
    let habit = create_test_habit(&db, "Gym").await?;
    Ok((db, habit))
}

/// UTC timestamp shorthand for test scenarios.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
}

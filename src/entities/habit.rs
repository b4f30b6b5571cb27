//! Habit entity - A recurring goal an owner tracks on a daily or weekly cadence.
//!
//! Cadence and difficulty are stored as lowercase text (`"daily"`, `"hard"`, ...)
//! and parsed into [`crate::core::period::Cadence`] and
//! [`crate::core::accountant::Difficulty`] by the core layer.
//! Streak fields are only ever written by the completion ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Habit database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "habits")]
pub struct Model {
    /// Unique identifier for the habit
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque owner id supplied by the identity provider
    pub owner_id: String,
    /// Short name shown to the owner (e.g., "Gym", "Read 20 pages")
    pub title: String,
    /// Free-form description, may be empty
    pub description: String,
    /// `"daily"` or `"weekly"`
    pub cadence: String,
    /// `"easy"`, `"medium"` or `"hard"`
    pub difficulty: String,
    /// Consecutive periods completed with no gap
    pub current_streak: u32,
    /// Highest `current_streak` ever reached
    pub best_streak: u32,
    /// Number of recorded completions
    pub total_completions: u32,
    /// Start date of the most recent period with a completion
    pub last_completed_period: Option<Date>,
    /// Soft delete flag - inactive habits are hidden and cannot be completed
    pub active: bool,
    /// When the habit was created
    pub created_at: DateTimeUtc,
    /// When the habit was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Habit and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One habit has many completions
    #[sea_orm(has_many = "super::completion::Entity")]
    Completions,
}

impl Related<super::completion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Completions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

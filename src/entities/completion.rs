//! Completion entity - One recorded instance of an owner performing a habit.
//!
//! Rows are append-only. The pair (`habit_id`, `period`) is unique; the index is
//! created alongside the tables in [`crate::config::database::create_tables`].
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Completion event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "completions")]
pub struct Model {
    /// Unique identifier for the completion
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Habit this completion belongs to
    pub habit_id: i64,
    /// Owner who completed the habit
    pub owner_id: String,
    /// Start date of the period the completion counts for
    pub period: Date,
    /// When the completion was submitted
    pub occurred_at: DateTimeUtc,
    /// XP granted for this completion
    pub xp_awarded: i64,
    /// Optional note left by the owner
    pub notes: Option<String>,
}

/// Defines relationships between Completion and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each completion belongs to one habit
    #[sea_orm(
        belongs_to = "super::habit::Entity",
        from = "Column::HabitId",
        to = "super::habit::Column::Id"
    )]
    Habit,
}

impl Related<super::habit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Habit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

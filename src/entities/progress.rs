//! Progress entity - Running XP total and level per owner.
//! Fed only by XP deltas the ledger reports; identity and profile data live elsewhere.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress database model - one row per owner
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "progress")]
pub struct Model {
    /// Owner id, doubles as primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,
    /// Total XP reported for this owner
    pub total_xp: i64,
    /// Level derived from `total_xp`
    pub level: u32,
    /// When XP was last reported
    pub updated_at: DateTimeUtc,
}

/// `Progress` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

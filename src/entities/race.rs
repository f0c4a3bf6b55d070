//! Race entity - one row per UTC race date.
//!
//! `settled_at` is the explicit settlement marker: once set, the race is never settled again.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Race database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "races")]
pub struct Model {
    /// UTC race date, `YYYY-MM-DD`
    #[sea_orm(primary_key, auto_increment = false)]
    pub race_date: String,
    /// Winning coin once settled
    pub winner_coin_id: Option<String>,
    /// When start prices were recorded
    pub started_at: Option<DateTimeUtc>,
    /// When the race was settled
    pub settled_at: Option<DateTimeUtc>,
}

/// Defines relationships between Race and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One race has one price row per coin
    #[sea_orm(has_many = "super::race_coin::Entity")]
    RaceCoins,
}

impl Related<super::race_coin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RaceCoins.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Race coin entity - start/end prices of one coin in one race.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Race coin database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "race_coins")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Race this row belongs to
    pub race_date: String,
    /// Coin id (e.g., `"eth"`)
    pub coin_id: String,
    /// Open price recorded when the race started
    pub start_price: Option<f64>,
    /// Close price recorded at settlement
    pub end_price: Option<f64>,
    /// Daily percent change recorded at settlement
    pub percent_change: Option<f64>,
}

/// Defines relationships between `RaceCoin` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one race
    #[sea_orm(
        belongs_to = "super::race::Entity",
        from = "Column::RaceDate",
        to = "super::race::Column::RaceDate"
    )]
    Race,
}

impl Related<super::race::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Race.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

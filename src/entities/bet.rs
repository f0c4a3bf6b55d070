//! Bet entity - a user's stake on one coin for one race date.
//!
//! Unique on (`user_id`, `race_date`). A bet is created `pending` and mutated exactly
//! once, at settlement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    /// Placed, waiting for settlement
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Picked the winning coin
    #[sea_orm(string_value = "won")]
    Won,
    /// Picked another coin
    #[sea_orm(string_value = "lost")]
    Lost,
}

/// Bet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bets")]
pub struct Model {
    /// Unique identifier for the bet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who placed the bet
    pub user_id: i64,
    /// UTC race date, `YYYY-MM-DD`
    pub race_date: String,
    /// Chosen coin id (e.g., `"btc"`)
    pub coin_id: String,
    /// Points staked
    pub stake: i64,
    /// Points paid out at settlement (0 until won)
    pub payout: i64,
    /// Lifecycle state
    pub status: BetStatus,
    /// When the bet was placed
    pub created_at: DateTimeUtc,
    /// When the bet was settled
    pub settled_at: Option<DateTimeUtc>,
}

/// Defines relationships between Bet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bet belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

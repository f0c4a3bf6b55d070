//! User entity - a tracker account with its point balance.
//!
//! `total_points` is only ever changed through `core::ledger`, which keeps it non-negative.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across users
    #[sea_orm(unique)]
    pub username: String,
    /// Chat platform user id once the account is linked
    #[sea_orm(unique)]
    pub chat_id: Option<String>,
    /// Current point balance, never negative
    pub total_points: i64,
    /// Whether this user can manage the catalog
    pub is_admin: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many plan entries
    #[sea_orm(has_many = "super::user_plan::Entity")]
    UserPlans,
    /// One user has many bets
    #[sea_orm(has_many = "super::bet::Entity")]
    Bets,
    /// One user has many point history rows
    #[sea_orm(has_many = "super::point_history::Entity")]
    PointHistory,
}

impl Related<super::user_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPlans.def()
    }
}

impl Related<super::bet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bets.def()
    }
}

impl Related<super::point_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PointHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

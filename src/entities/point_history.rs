//! Point history entity - append-only audit log of every point delta.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Point history database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "point_history")]
pub struct Model {
    /// Unique identifier for the history row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User whose balance changed
    pub user_id: i64,
    /// Task that caused the change, if any
    pub task_id: Option<i64>,
    /// Signed point delta (positive for credits, negative for debits)
    pub points: i64,
    /// Human-readable reason
    pub reason: String,
    /// When the change happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `PointHistory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each history row belongs to one user
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

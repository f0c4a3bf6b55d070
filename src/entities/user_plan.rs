//! User plan entity - one task a user has added to their personal plan.
//!
//! Unique on (`user_id`, `task_id`). `completed_at` is compared against the KST reset
//! boundaries to decide whether a completion has expired.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User plan database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_plans")]
pub struct Model {
    /// Unique identifier for the plan entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the plan entry
    pub user_id: i64,
    /// Planned task
    pub task_id: i64,
    /// Whether the task is completed for the current period
    pub completed: bool,
    /// When the task was last completed
    pub completed_at: Option<DateTimeUtc>,
    /// Optional amount the user spent doing the task (gas, bridge fees, ...)
    pub cost: Option<f64>,
    /// When the task was added to the plan
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `UserPlan` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each plan entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each plan entry refers to one task
    #[sea_orm(
        belongs_to = "super::task::Entity",
        from = "Column::TaskId",
        to = "super::task::Column::Id"
    )]
    Task,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

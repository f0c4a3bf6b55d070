//! Task entity - a recurring or one-time action attached to an article.
//!
//! The task's [`TaskFrequency`] decides how many points a completion is worth and
//! which reset boundary clears it again.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How often a task can be completed for points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    /// Resets at every KST midnight
    #[sea_orm(string_value = "daily")]
    Daily,
    /// Resets at KST midnight starting each Sunday
    #[sea_orm(string_value = "weekly")]
    Weekly,
    /// Never resets
    #[sea_orm(string_value = "once")]
    Once,
}

impl TaskFrequency {
    /// Points awarded for completing a task of this frequency, and taken back on reversal.
    ///
    /// This is the single points table shared by the awarder and the reset job.
    #[must_use]
    pub const fn points(self) -> i64 {
        match self {
            Self::Daily => 100,
            Self::Weekly => 500,
            Self::Once => 1000,
        }
    }

    /// Lowercase label used in messages and history reasons
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Once => "one-time",
        }
    }
}

/// Task database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    /// Unique identifier for the task
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Article this task belongs to
    pub article_id: i64,
    /// What the user has to do (e.g., "Swap on testnet")
    pub title: String,
    /// Reset cadence and point value
    pub frequency: TaskFrequency,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the task was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Task and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each task belongs to one article
    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id"
    )]
    Article,
    /// One task appears in many user plans
    #[sea_orm(has_many = "super::user_plan::Entity")]
    UserPlans,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl Related<super::user_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserPlans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

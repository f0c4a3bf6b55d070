//! Article entity - a curated crypto project that groups airdrop tasks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Article database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    /// Unique identifier for the article
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Project name shown in listings
    pub title: String,
    /// Short description of the project and its airdrop
    pub description: String,
    /// Optional link to the project
    pub url: Option<String>,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the article was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Article and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One article has many tasks
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

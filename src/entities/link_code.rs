//! Link code entity - short-lived code that binds a chat identity to a user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link code database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "link_codes")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The code the user types into the chat
    #[sea_orm(unique)]
    pub code: String,
    /// User the code was issued for
    pub user_id: i64,
    /// Code is rejected after this instant
    pub expires_at: DateTimeUtc,
    /// When the code was issued
    pub created_at: DateTimeUtc,
}

/// `LinkCode` has no navigable relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

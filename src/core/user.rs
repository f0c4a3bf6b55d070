//! User business logic - accounts, chat identities, leaderboard and point history.

use crate::{
    entities::{PointHistory, User, point_history, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Creates a user with a zero balance.
///
/// The username is trimmed and must be non-empty; uniqueness is enforced by the table.
pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    chat_id: Option<String>,
    now: DateTime<Utc>,
) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Config {
            message: "Username cannot be empty".to_string(),
        });
    }

    let model = user::ActiveModel {
        username: Set(username.to_string()),
        chat_id: Set(chat_id),
        total_points: Set(0),
        is_admin: Set(false),
        created_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Finds a user by primary key.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by exact username.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the user linked to a chat platform identity.
pub async fn get_user_by_chat_id(
    db: &DatabaseConnection,
    chat_id: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::ChatId.eq(chat_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user linked to `chat_id`, creating an account on first contact.
///
/// The display name becomes the username; if it is taken, the chat id is appended.
pub async fn get_or_create_chat_user(
    db: &DatabaseConnection,
    chat_id: &str,
    display_name: &str,
    now: DateTime<Utc>,
) -> Result<user::Model> {
    if let Some(existing) = get_user_by_chat_id(db, chat_id).await? {
        return Ok(existing);
    }

    let username = if get_user_by_username(db, display_name).await?.is_some() {
        format!("{}#{chat_id}", display_name.trim())
    } else {
        display_name.to_string()
    };

    create_user(db, &username, Some(chat_id.to_string()), now).await
}

/// Users ordered by balance (highest first), ties broken by account age.
pub async fn leaderboard(db: &DatabaseConnection, limit: u64) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_desc(user::Column::TotalPoints)
        .order_by_asc(user::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Most recent point history rows for a user, newest first.
pub async fn get_point_history(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<point_history::Model>> {
    PointHistory::find()
        .filter(point_history::Column::UserId.eq(user_id))
        .order_by_desc(point_history::Column::CreatedAt)
        .order_by_desc(point_history::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_user(&db, "   ", None, Utc::now()).await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));

        let user = create_user(&db, "  alice ", None, Utc::now()).await?;
        assert_eq!(user.username, "alice");
        assert_eq!(user.total_points, 0);
        assert!(!user.is_admin);

        // Usernames are unique
        assert!(create_user(&db, "alice", None, Utc::now()).await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_create_chat_user() -> Result<()> {
        let db = setup_test_db().await?;

        let first = get_or_create_chat_user(&db, "42", "bob", Utc::now()).await?;
        let again = get_or_create_chat_user(&db, "42", "bobby", Utc::now()).await?;
        assert_eq!(first.id, again.id);
        assert_eq!(again.username, "bob");

        // Same display name from another chat account gets a suffixed username
        let other = get_or_create_chat_user(&db, "43", "bob", Utc::now()).await?;
        assert_ne!(other.id, first.id);
        assert_eq!(other.username, "bob#43");

        let found = get_user_by_chat_id(&db, "43").await?.unwrap();
        assert_eq!(found.id, other.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_leaderboard_order() -> Result<()> {
        let db = setup_test_db().await?;
        let low = create_test_user(&db, "low", 100).await?;
        let high = create_test_user(&db, "high", 900).await?;
        let mid = create_test_user(&db, "mid", 500).await?;

        let board = leaderboard(&db, 2).await?;
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].id, high.id);
        assert_eq!(board[1].id, mid.id);
        assert!(board.iter().all(|u| u.id != low.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_point_history_newest_first() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;
        let earlier = Utc::now() - chrono::Duration::hours(1);

        ledger::record_history(&db, user.id, None, 10, "first".to_string(), earlier).await?;
        ledger::record_history(&db, user.id, None, -5, "second".to_string(), Utc::now()).await?;

        let history = get_point_history(&db, user.id, 10).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].reason, "second");
        assert_eq!(history[1].reason, "first");

        Ok(())
    }
}
